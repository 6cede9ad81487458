use crate::error::Result;
use blockforge::workflows::build::BuildContext;

pub fn run(context: &BuildContext) -> Result<()> {
    let registry = context.registry();
    let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(0);
    for name in registry.names() {
        let description = registry
            .get(name)
            .map(|m| m.description.as_str())
            .unwrap_or_default();
        println!("{name:<width$}  {description}");
    }
    Ok(())
}

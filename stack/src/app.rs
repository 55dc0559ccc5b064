use crate::stack::UserManagerStack;
use crate::template::Template;
use eyre::{ContextCompat, WrapErr};
use std::collections::BTreeMap;

/// Top level container for stacks
///
/// The application object owns the resource graphs and hands them to
/// synthesis as one unit. Construction performs no I/O; every build yields
/// an independent graph.
#[derive(Debug, Clone, Default)]
pub struct App {
    stacks: Vec<UserManagerStack>,
}

/// Synthesized output of an app, one template per stack
#[derive(Debug, Clone)]
pub struct Assembly {
    templates: BTreeMap<String, Template>,
}

impl App {
    pub fn new() -> Self {
        App::default()
    }

    pub fn add_stack(&mut self, stack: UserManagerStack) {
        self.stacks.push(stack);
    }

    /// Convert every stack's resource graph into its deployment template
    pub fn synth(&self) -> eyre::Result<Assembly> {
        let mut templates = BTreeMap::new();

        for stack in self.stacks.iter() {
            let template = Template::from_stack(stack)
                .wrap_err(format!("Failed to synthesize stack {}", stack.name))?;

            templates.insert(stack.name.clone(), template);
        }

        Ok(Assembly { templates })
    }
}

impl Assembly {
    pub fn template(&self, stack_name: &str) -> eyre::Result<&Template> {
        self.templates
            .get(stack_name)
            .wrap_err(format!("No template for stack {stack_name}"))
    }

    pub fn templates(&self) -> impl Iterator<Item = (&String, &Template)> {
        self.templates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::Env;

    #[test]
    fn synth_yields_one_template_per_stack() {
        let mut app = App::new();
        app.add_stack(UserManagerStack::new(
            "user-manager",
            Env::new("111111111111", "eu-central-1"),
        ));

        let assembly = app.synth().unwrap();

        assert!(assembly.template("user-manager").is_ok());
        assert!(assembly.template("other").is_err());
        assert_eq!(assembly.templates().count(), 1);
    }
}

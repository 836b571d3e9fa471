use inquire::Text;
use inquire::validator::Validation;

use crate::names::normalize;

/// Use `name` if given, otherwise ask for one.
pub fn name_or_prompt(
    name: Option<String>,
    message: &str,
    non_interactive: bool,
) -> anyhow::Result<String> {
    if let Some(n) = name {
        Ok(n)
    } else if non_interactive {
        anyhow::bail!("A name is required in non-interactive mode");
    } else {
        Ok(Text::new(message)
            .with_validator(|input: &str| {
                if normalize(input).is_empty() {
                    Ok(Validation::Invalid(
                        "Name must contain at least one letter or digit".into(),
                    ))
                } else {
                    Ok(Validation::Valid)
                }
            })
            .prompt()?)
    }
}

pub fn confirm_action(message: &str, yes: bool, non_interactive: bool) -> anyhow::Result<bool> {
    if yes {
        Ok(true)
    } else if non_interactive {
        anyhow::bail!("--yes is required for destructive operations in non-interactive mode");
    } else {
        Ok(inquire::Confirm::new(message)
            .with_default(false)
            .prompt()?)
    }
}

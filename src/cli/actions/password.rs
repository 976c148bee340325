use crate::features::auth::password::{PasswordRule, assess, requirements_text};
use anyhow::{Result, bail};
use secrecy::{ExposeSecret, SecretString};

/// Execute the password-check action.
/// # Errors
/// Returns an error when the password fails any rule, so the exit status reflects the result.
pub fn check(password: &SecretString) -> Result<()> {
    let assessment = assess(password.expose_secret());

    for rule in PasswordRule::ALL {
        let mark = if assessment.checks.passed(rule) { "ok" } else { "--" };
        println!("[{mark}] {}", rule.label());
    }
    println!("strength: {}", assessment.strength.label());

    if assessment.is_valid {
        return Ok(());
    }

    println!();
    for message in &assessment.errors {
        println!("{message}");
    }
    println!();
    println!("{}", requirements_text());
    bail!("password does not meet the policy")
}

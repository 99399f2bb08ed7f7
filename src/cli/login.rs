use super::ui;
use crate::App;
use anyhow::{Context, Result};
use console::Term;

pub async fn login(
    app: &App,
    email: Option<String>,
    password: Option<String>,
    remember_me: bool,
) -> Result<()> {
    let service = app.login_service()?;
    let term = Term::stderr();

    let email = match email.or_else(|| service.remembered_email()) {
        Some(email) => email,
        None => {
            term.write_str("Email: ")?;
            term.read_line().context("Failed to read email")?
        }
    };
    let password = match password {
        Some(password) => password,
        None => {
            term.write_str(&format!("Password for {email}: "))?;
            term.read_secure_line().context("Failed to read password")?
        }
    };

    let logged_in = service.login(&email, &password, remember_me).await?;
    let greeting = match &logged_in.name {
        Some(name) => format!("Welcome, {name}!"),
        None => "Logged in".to_string(),
    };
    println!("{}", ui::style_text(&greeting, ui::StyleType::Success));
    if remember_me {
        println!("{}", ui::style_text("Your email will be remembered", ui::StyleType::Subtle));
    }
    Ok(())
}

pub async fn logout(app: &App) -> Result<()> {
    app.session.clear_session().await?;
    println!("Logged out");
    Ok(())
}

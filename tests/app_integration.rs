use std::fs;
use std::path::Path;
use subtrack::cli::edit::SubscriptionChanges;
use subtrack::cli::settings::SettingsCommand;
use subtrack::core::config::AppConfig;
use subtrack::core::sort::SortCriterion;
use subtrack::core::subscription::{SubscriptionDraft, SubscriptionStatus};
use subtrack::{App, AppCommand, run_command};
use tempfile::TempDir;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_rates_server(base: &str, body: &str, expected_calls: u64) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/v6/latest/{base}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(expected_calls)
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub async fn create_failing_rates_server() -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        mock_server
    }
}

/// Writes a config that keeps all state inside `dir`.
fn write_config(dir: &Path, providers: &str) -> String {
    let config_path = dir.join("config.yaml");
    let data_path = dir.join("data");
    let content = format!(
        r#"
providers:
{providers}
rates:
  timeout_secs: 2
data_path: "{}"
"#,
        data_path.display()
    );
    fs::write(&config_path, content).expect("Failed to write config file");
    config_path.to_string_lossy().into_owned()
}

fn static_providers() -> &'static str {
    "  rates:\n    kind: static\n"
}

fn open_app(config_path: &str) -> App {
    App::open(AppConfig::load_from_path(config_path).unwrap()).unwrap()
}

async fn run(command: AppCommand, config_path: &str) {
    let result = run_command(command, Some(config_path)).await;
    assert!(result.is_ok(), "Command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_demo_list_and_total_offline() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(dir.path(), static_providers());

    run(AppCommand::Demo, &config_path).await;
    run(AppCommand::List { sort: Some(SortCriterion::PriceDescending) }, &config_path).await;
    run(AppCommand::Total, &config_path).await;
    run(AppCommand::Rates { base: Some("eur".to_string()) }, &config_path).await;

    let app = open_app(&config_path);
    assert_eq!(app.subscriptions.all().len(), 4);

    // Display currency defaults to the euro symbol, so EUR-based rates are used.
    // Only the USD subscription is active.
    let pipeline = app.pipeline(SortCriterion::default());
    let view = subtrack::cli::list::settled_view(&pipeline).await;
    info!(total = %view.monthly_total, "Computed monthly total");
    assert_eq!(view.monthly_total.currency, "€");
    assert!((view.monthly_total.amount - 12.99 / 1.08).abs() < 1e-9);
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock_rates() {
    let body = r#"{ "result": "success", "rates": { "USD": 1, "EUR": 0.92, "GBP": 0.79 } }"#;
    // One fetch per `list` and `total` run; each run starts with an empty cache.
    let mock_server = test_utils::create_rates_server("USD", body, 2).await;

    let dir = TempDir::new().unwrap();
    let providers = format!("  rates:\n    kind: http\n    base_url: {}\n", mock_server.uri());
    let config_path = write_config(dir.path(), &providers);

    run(AppCommand::Settings(SettingsCommand::Currency("USD".to_string())), &config_path).await;
    for (name, cost, currency) in [("Video", "12.99", "USD"), ("Storage", "5.00", "EUR")] {
        let draft = SubscriptionDraft {
            name: name.to_string(),
            cost: cost.to_string(),
            currency: currency.to_string(),
            ..Default::default()
        };
        run(AppCommand::Add(draft), &config_path).await;
    }
    run(AppCommand::List { sort: None }, &config_path).await;
    run(AppCommand::Total, &config_path).await;

    let app = open_app(&config_path);
    let storage = app
        .subscriptions
        .all()
        .into_iter()
        .find(|r| r.name == "Storage")
        .unwrap();
    assert_eq!(storage.base_currency, "EUR");
    assert_eq!(storage.base_cost, 5.0);
}

#[test_log::test(tokio::test)]
async fn test_list_survives_rate_service_outage() {
    let mock_server = test_utils::create_failing_rates_server().await;
    let dir = TempDir::new().unwrap();
    let providers = format!("  rates:\n    base_url: {}\n", mock_server.uri());
    let config_path = write_config(dir.path(), &providers);

    run(AppCommand::Demo, &config_path).await;
    run(AppCommand::List { sort: None }, &config_path).await;

    let result = run_command(AppCommand::Rates { base: None }, Some(&config_path)).await;
    assert!(result.is_err());

    let app = open_app(&config_path);
    let pipeline = app.pipeline(SortCriterion::default());
    let view = subtrack::cli::list::settled_view(&pipeline).await;
    assert_eq!(view.subscriptions.len(), 4);
    assert!(view.rates_fetched_at.is_none());
    assert!((view.monthly_total.amount - 12.99).abs() < 1e-9);
    assert_eq!(view.monthly_total.currency, "USD");
}

#[test_log::test(tokio::test)]
async fn test_edit_and_remove() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(dir.path(), static_providers());
    run(AppCommand::Demo, &config_path).await;

    let changes = SubscriptionChanges {
        status: Some(SubscriptionStatus::Active),
        cost: Some("6.25".to_string()),
        ..Default::default()
    };
    run(AppCommand::Edit { id: "3".to_string(), changes }, &config_path).await;
    run(AppCommand::Remove { id: "4".to_string() }, &config_path).await;

    let missing = run_command(AppCommand::Remove { id: "4".to_string() }, Some(&config_path)).await;
    assert!(missing.unwrap_err().to_string().contains("not found"));

    let empty_edit = AppCommand::Edit {
        id: "1".to_string(),
        changes: SubscriptionChanges::default(),
    };
    assert!(run_command(empty_edit, Some(&config_path)).await.is_err());

    let app = open_app(&config_path);
    let records = app.subscriptions.all();
    assert_eq!(records.len(), 3);
    let cloud = records.iter().find(|r| r.id == "3").unwrap();
    assert_eq!(cloud.status, SubscriptionStatus::Active);
    assert_eq!(cloud.base_cost, 6.25);
}

#[test_log::test(tokio::test)]
async fn test_login_and_logout() {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let auth_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Welcome",
            "userId": "u-1",
            "nombre": "Ana"
        })))
        .mount(&auth_server)
        .await;

    let dir = TempDir::new().unwrap();
    let providers = format!(
        "  rates:\n    kind: static\n  auth:\n    base_url: {}\n",
        auth_server.uri()
    );
    let config_path = write_config(dir.path(), &providers);

    let login = AppCommand::Login {
        email: Some("ana@example.com".to_string()),
        password: Some("secret".to_string()),
        remember_me: true,
    };
    run(login, &config_path).await;
    {
        let app = open_app(&config_path);
        let session = app.session.current();
        assert_eq!(session.email.as_deref(), Some("ana@example.com"));
        assert_eq!(session.user_id.as_deref(), Some("u-1"));
    }

    run(AppCommand::Logout, &config_path).await;
    let app = open_app(&config_path);
    assert!(!app.session.current().remember_me);
}

#[test_log::test(tokio::test)]
async fn test_login_requires_configured_service() {
    let dir = TempDir::new().unwrap();
    let config_path = write_config(dir.path(), static_providers());
    let login = AppCommand::Login {
        email: Some("ana@example.com".to_string()),
        password: Some("secret".to_string()),
        remember_me: false,
    };
    let err = run_command(login, Some(&config_path)).await.unwrap_err();
    assert!(err.to_string().contains("No login service configured"));
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.yaml");
    let result = run_command(AppCommand::Total, Some(path.to_str().unwrap())).await;
    assert!(result.is_err());
}

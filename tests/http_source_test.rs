use std::sync::Arc;

use anyhow::Result;
use tally::application::{AppError, BudgetSession};
use tally::config::ImportConfig;
use tally::import::{HttpImportSource, ImportError, ImportSource};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response on a local port and return the endpoint URL.
async fn serve_once(status_line: &'static str, body: &'static str) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    Ok(format!("http://{}/transactions", addr))
}

fn config_for(endpoint: Option<String>) -> ImportConfig {
    ImportConfig {
        endpoint,
        ..ImportConfig::default()
    }
}

#[tokio::test]
async fn test_error_status_maps_to_status_error() -> Result<()> {
    let endpoint = serve_once("503 Service Unavailable", "").await?;
    let source = HttpImportSource::new(&config_for(Some(endpoint)))?;

    let result = source.fetch_records().await;

    assert!(matches!(result, Err(ImportError::Status(503))));
    Ok(())
}

#[tokio::test]
async fn test_malformed_body_maps_to_payload_error() -> Result<()> {
    let endpoint = serve_once("200 OK", "not json").await?;
    let source = HttpImportSource::new(&config_for(Some(endpoint)))?;

    let result = source.fetch_records().await;

    assert!(matches!(result, Err(ImportError::Payload(_))));
    Ok(())
}

#[tokio::test]
async fn test_json_array_is_fetched_and_imported() -> Result<()> {
    let endpoint = serve_once(
        "200 OK",
        r#"[{"id": 1, "amount": 12.5}, {"id": 2, "amount": "7.25"}]"#,
    )
    .await?;
    let config = config_for(Some(endpoint));
    let source = HttpImportSource::new(&config)?;
    let session = BudgetSession::new(Arc::new(source), config);

    let summary = session.import_now().await?;

    assert_eq!(summary.imported.len(), 2);
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.expenses[0].description, "Transaction 1");
    assert_eq!(snapshot.total_expenses, 1975);
    Ok(())
}

#[tokio::test]
async fn test_failed_http_import_leaves_ledger_unchanged() -> Result<()> {
    for (status_line, body) in [("503 Service Unavailable", ""), ("200 OK", "not json")] {
        let endpoint = serve_once(status_line, body).await?;
        let config = config_for(Some(endpoint));
        let source = HttpImportSource::new(&config)?;
        let session = BudgetSession::new(Arc::new(source), config);
        session.set_income_text("1000").await;
        session.add_expense("Internet", "100").await.unwrap();

        let result = session.import_now().await;

        assert!(matches!(result, Err(AppError::Import(_))));
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.expenses.len(), 1);
        assert_eq!(snapshot.balance, 90000);
    }
    Ok(())
}

#[tokio::test]
async fn test_missing_endpoint_is_reported() -> Result<()> {
    let config = config_for(None);
    let source = HttpImportSource::new(&config)?;
    let session = BudgetSession::new(Arc::new(source), config);
    session.add_expense("Rent", "2000").await.unwrap();

    let result = session.import_now().await;

    assert!(matches!(result, Err(AppError::Import(ImportError::NoEndpoint))));
    assert_eq!(session.snapshot().await.expenses.len(), 1);
    Ok(())
}

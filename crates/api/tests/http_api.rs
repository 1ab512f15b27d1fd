use pos_purchase_core::InvoiceNumber;
use purchase_api::http::{HttpOptions, HttpPurchaseApi, Session};
use purchase_api::{ApiError, PurchaseApi};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use warp::http::StatusCode;
use warp::Filter;

#[derive(Debug, Clone)]
struct Recorded {
    content_type: String,
    cookie: Option<String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

/// Minimal purchase backend: `INV TAKEN/1` already exists, `INV-NOFIELD`,
/// `INV-NULL` and `INV-500` get lookup answers without a usable `exists`
/// flag. A submission with `no_faktur == "DUP"` is refused with a JSON
/// message, `BROKEN` gets an empty 500.
async fn spawn_backend() -> (String, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let check = warp::path!("api" / "check_invoice_number")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .map(|q: HashMap<String, String>| {
            let number = q.get("invoice_number").map(String::as_str).unwrap_or_default();
            let (reply, status) = match number {
                "INV-NOFIELD" => (json!({"success": true}), StatusCode::OK),
                "INV-NULL" => (json!({"exists": null}), StatusCode::OK),
                "INV-500" => (json!({"exists": false}), StatusCode::INTERNAL_SERVER_ERROR),
                _ => {
                    let exists = number == "INV TAKEN/1";
                    (
                        json!({"success": true, "exists": exists, "available": !exists}),
                        StatusCode::OK,
                    )
                }
            };
            warp::reply::with_status(warp::reply::json(&reply), status)
        });

    let slow_check = warp::path!("lambat")
        .and(warp::get())
        .and_then(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok::<_, warp::Rejection>(warp::reply::json(&json!({"exists": false})))
        });

    let html_check = warp::path!("login")
        .and(warp::get())
        .map(|| warp::reply::html("<html>login</html>"));

    let log_submit = Arc::clone(&log);
    let submit = warp::path!("pembelian")
        .and(warp::post())
        .and(warp::header::<String>("content-type"))
        .and(warp::header::optional::<String>("cookie"))
        .and(warp::body::json())
        .map(move |content_type: String, cookie: Option<String>, body: Value| {
            log_submit.lock().unwrap().push(Recorded {
                content_type,
                cookie,
                body: body.clone(),
            });
            match body.get("no_faktur").and_then(Value::as_str) {
                Some("DUP") => warp::reply::with_status(
                    warp::reply::json(&json!({
                        "success": false,
                        "message": "Nomor faktur DUP sudah ada.",
                    })),
                    StatusCode::BAD_REQUEST,
                ),
                Some("BROKEN") => warp::reply::with_status(
                    warp::reply::json(&json!(null)),
                    StatusCode::INTERNAL_SERVER_ERROR,
                ),
                _ => warp::reply::with_status(
                    warp::reply::json(&json!({
                        "success": true,
                        "message": "Pembelian berhasil disimpan.",
                    })),
                    StatusCode::OK,
                ),
            }
        });

    let plain_submit = warp::path!("catatan")
        .and(warp::post())
        .map(|| warp::reply::html("<p>tersimpan</p>"));

    let page = warp::path!("pembelian")
        .and(warp::get())
        .map(|| warp::reply::html("<html>pembelian</html>"));

    let routes = check
        .or(slow_check)
        .or(html_check)
        .or(submit)
        .or(plain_submit)
        .or(page);
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    (format!("http://{addr}"), log)
}

fn api(base: &str, session: Session) -> Arc<HttpPurchaseApi> {
    HttpPurchaseApi::new(base, session, HttpOptions::default()).unwrap()
}

fn body(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

#[tokio::test]
async fn check_sends_url_encoded_number() {
    let (base, _log) = spawn_backend().await;
    let api = api(&base, Session::Anonymous);

    let taken = InvoiceNumber::parse("INV TAKEN/1").unwrap();
    let check = api.check_invoice_number(&taken).await.unwrap();
    assert_eq!(check.exists, Some(true));
    assert!(check.is_taken());
    assert_eq!(check.available, Some(false));

    let free = InvoiceNumber::parse("INV-001").unwrap();
    assert!(!api.check_invoice_number(&free).await.unwrap().is_taken());
}

#[tokio::test]
async fn check_reply_without_exists_leaves_number_free() {
    let (base, _log) = spawn_backend().await;
    let api = api(&base, Session::Anonymous);

    let number = InvoiceNumber::parse("INV-NOFIELD").unwrap();
    let check = api.check_invoice_number(&number).await.unwrap();
    assert_eq!(check.exists, None);
    assert!(!check.is_taken());
}

#[tokio::test]
async fn check_reply_with_null_exists_leaves_number_free() {
    let (base, _log) = spawn_backend().await;
    let api = api(&base, Session::Anonymous);

    let number = InvoiceNumber::parse("INV-NULL").unwrap();
    let check = api.check_invoice_number(&number).await.unwrap();
    assert_eq!(check.exists, None);
    assert!(!check.is_taken());
}

#[tokio::test]
async fn check_reply_is_read_despite_error_status() {
    let (base, _log) = spawn_backend().await;
    let api = api(&base, Session::Anonymous);

    let number = InvoiceNumber::parse("INV-500").unwrap();
    let check = api.check_invoice_number(&number).await.unwrap();
    assert_eq!(check.exists, Some(false));
    assert!(!check.is_taken());
}

#[tokio::test]
async fn configured_timeout_cuts_off_slow_backend() {
    let (base, _log) = spawn_backend().await;
    let api = HttpPurchaseApi::new(
        &base,
        Session::Anonymous,
        HttpOptions {
            check_path: "/lambat".to_string(),
            timeout: Some(Duration::from_millis(200)),
        },
    )
    .unwrap();

    let number = InvoiceNumber::parse("INV-001").unwrap();
    let err = api.check_invoice_number(&number).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn check_against_html_page_is_a_decode_error() {
    let (base, _log) = spawn_backend().await;
    let api = HttpPurchaseApi::new(
        &base,
        Session::Anonymous,
        HttpOptions {
            check_path: "/login".to_string(),
            timeout: None,
        },
    )
    .unwrap();

    let number = InvoiceNumber::parse("INV-001").unwrap();
    let err = api.check_invoice_number(&number).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn check_with_server_down_is_a_transport_error() {
    let api = api("http://127.0.0.1:9", Session::Anonymous);
    let number = InvoiceNumber::parse("INV-001").unwrap();
    let err = api.check_invoice_number(&number).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn submit_posts_json_with_session_cookie() {
    let (base, log) = spawn_backend().await;
    let api = api(&base, Session::Cookie("session=abc123".into()));

    let sent = body(&[("no_faktur", "INV-001"), ("supplier", "3")]);
    let receipt = api.submit_form("/pembelian", &sent).await.unwrap();
    assert_eq!(receipt.status, 200);
    assert_eq!(receipt.body["success"], json!(true));

    let recorded = log.lock().unwrap().clone();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].content_type, "application/json");
    assert_eq!(recorded[0].cookie.as_deref(), Some("session=abc123"));
    assert_eq!(recorded[0].body, Value::Object(sent));
}

#[tokio::test]
async fn refused_submit_carries_server_message() {
    let (base, _log) = spawn_backend().await;
    let api = api(&base, Session::Anonymous);

    let err = api
        .submit_form("/pembelian", &body(&[("no_faktur", "DUP")]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 400,
            message: Some("Nomor faktur DUP sudah ada.".into()),
        }
    );

    let err = api
        .submit_form("/pembelian", &body(&[("no_faktur", "BROKEN")]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Status {
            status: 500,
            message: None,
        }
    );
}

#[tokio::test]
async fn accepted_submit_with_non_json_reply_is_a_decode_error() {
    let (base, _log) = spawn_backend().await;
    let api = api(&base, Session::Anonymous);

    let err = api
        .submit_form("/catatan", &body(&[("no_faktur", "INV-001")]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn load_page_reports_status() {
    let (base, _log) = spawn_backend().await;
    let api = api(&base, Session::Anonymous);

    assert_eq!(api.load_page("/pembelian").await.unwrap(), 200);
    let err = api.load_page("/tidak-ada").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }));
}

use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use anyhow::anyhow;
use log::debug;
use serde::Serialize;

use crate::errors::ServerError;

pub async fn get_request(path: &str, configure: impl FnOnce(&mut ServiceConfig)) -> anyhow::Result<(StatusCode, String)> {
    send(TestRequest::get().uri(path), configure).await
}

pub async fn post_request<T: Serialize>(
    path: &str,
    body: &T,
    configure: impl FnOnce(&mut ServiceConfig),
) -> anyhow::Result<(StatusCode, String)> {
    send(TestRequest::post().uri(path).set_json(body), configure).await
}

pub async fn post_raw(
    path: &str,
    body: &'static str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> anyhow::Result<(StatusCode, String)> {
    let req = TestRequest::post().uri(path).insert_header(("content-type", "application/json")).set_payload(body);
    send(req, configure).await
}

async fn send(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> anyhow::Result<(StatusCode, String)> {
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| ServerError::InvalidRequestBody(err.to_string()).into());
    let app = App::new().app_data(json_config).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| anyhow!(e.to_string()))?.into_parts();
    let status = res.status();
    let bytes = res.into_body().try_into_bytes().map_err(|_| anyhow!("Could not read response body"))?;
    Ok((status, String::from_utf8_lossy(&bytes).into_owned()))
}

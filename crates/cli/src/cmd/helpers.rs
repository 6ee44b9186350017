use anyhow::Result;
use reqwest::Method;

pub const DEFAULT_SERVER: &str = "http://localhost:8080";

/// Precedence: --server flag, then VULNWATCH_SERVER, then localhost.
pub fn resolve_server(server_flag: Option<&str>) -> String {
    if let Some(s) = server_flag {
        return s.trim_end_matches('/').to_string();
    }
    std::env::var("VULNWATCH_SERVER")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_SERVER.to_string())
}

/// Accepts either a path to a JSON file or inline JSON.
pub fn parse_json_data(data: &str) -> Result<serde_json::Value> {
    if std::path::Path::new(data).exists() {
        let content = std::fs::read_to_string(data)?;
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(data)?)
    }
}

pub async fn fetch_json(url: &str) -> Result<serde_json::Value> {
    Ok(reqwest::get(url).await?.error_for_status()?.json().await?)
}

/// Sends `body` with the given method and decodes the JSON response.
pub async fn send_json(
    method: Method,
    url: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value> {
    let resp = reqwest::Client::new()
        .request(method, url)
        .json(body)
        .send()
        .await?
        .error_for_status()?;
    Ok(resp.json().await?)
}

pub async fn delete(url: &str) -> Result<()> {
    reqwest::Client::new()
        .delete(url)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins() {
        assert_eq!(
            resolve_server(Some("http://example.com:9090/")),
            "http://example.com:9090"
        );
    }

    #[test]
    fn falls_back_to_default() {
        // Env-var precedence is covered manually; unset in CI.
        if std::env::var("VULNWATCH_SERVER").is_err() {
            assert_eq!(resolve_server(None), DEFAULT_SERVER);
        }
    }

    #[test]
    fn inline_json_parses() {
        let v = parse_json_data(r#"{"name": "x"}"#).unwrap();
        assert_eq!(v["name"], "x");
    }

    #[test]
    fn garbage_rejected() {
        assert!(parse_json_data("not json").is_err());
    }
}

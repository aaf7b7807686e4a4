// This test simulates:
//  - the upstream address API (token, addresszip, searchcode)
//  - the proxy in front of it
//  - a proxy-mode client with the default credentials provider
// and checks that every call is relayed with the right credentials.

#[cfg(test)]
mod test {

    use std::sync::Arc;

    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use serde_json::json;

    use crate::client::{ConnectionInfo, DefaultCredentialsProvider, Latte};
    use crate::error::LatteError;
    use crate::models::{AddressZipRequest, MatchLevel, SearchCodeRequest};
    use crate::tests::common::{proxy_config, spawn_proxy};

    fn mock_upstream_token(upstream: &MockServer) -> httpmock::Mock<'_> {
        upstream.mock(|when, then| {
            when.method(POST).path("/api/v1/j/token").json_body(json!({
                "client_id": "test-client",
                "secret_key": "test-secret",
                "grant_type": "client_credentials",
            }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({
                    "token": "upstream-bearer",
                    "token_type": "Bearer",
                    "expires_in": 600,
                    "scope": "J1",
                }));
        })
    }

    fn proxy_client(proxy: std::net::SocketAddr) -> Latte {
        let provider = Arc::new(DefaultCredentialsProvider::new());
        Latte::new(ConnectionInfo::proxy(format!("http://{}", proxy)).with(provider))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn client_reaches_upstream_through_proxy() {
        let upstream = MockServer::start_async().await;
        let token = mock_upstream_token(&upstream);
        let addresszip = upstream.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/addresszip")
                .header("Authorization", "Bearer upstream-bearer");
            then.status(200).json_body(json!({
                "level": 1,
                "page": 1,
                "limit": 1000,
                "count": 1,
                "addresses": [{
                    "zip_code": "",
                    "pref_code": "13",
                    "pref_name": "東京都",
                    "pref_kana": "トウキョウト",
                    "pref_roma": "TOKYO",
                    "city_code": "",
                    "city_name": "",
                    "city_kana": "",
                    "city_roma": "",
                    "town_name": "",
                    "town_kana": "",
                    "town_roma": ""
                }]
            }));
        });
        let search = upstream.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/searchcode/1000001")
                .query_param("limit", "1")
                .header("Authorization", "Bearer upstream-bearer");
            then.status(200).json_body(json!({
                "page": 1,
                "limit": 1,
                "count": 1,
                "searchtype": "zipcode",
                "addresses": [{
                    "dgacode": null,
                    "zip_code": "1000001",
                    "pref_code": "13",
                    "pref_name": "東京都",
                    "city_code": 13101,
                    "city_name": "千代田区",
                    "town_name": "千代田"
                }]
            }));
        });

        let config = proxy_config(&upstream.base_url()).await;
        let (proxy_handle, proxy_addr) = spawn_proxy(&config).await;
        let latte = proxy_client(proxy_addr);

        let bearer = latte.get_token().await.unwrap();
        assert_eq!(bearer, "upstream-bearer");

        let request = AddressZipRequest {
            pref_name: "東京都".to_owned(),
            flg_get_city: true,
            ..AddressZipRequest::default()
        };
        let zip = latte.address_zip(&bearer, &request).await.unwrap();
        assert_eq!(zip.level, MatchLevel::Prefecture);
        assert_eq!(zip.addresses[0].pref_name, "東京都");

        let found = latte
            .with_token(|bearer| {
                let latte = &latte;
                async move { latte.search(&bearer, "1000001", &SearchCodeRequest::default()).await }
            })
            .await
            .unwrap();
        assert_eq!(found.addresses[0].city_code, Some(13101));

        // the bearer token was cached; one upstream token call in total
        assert_eq!(token.hits_async().await, 1);
        assert_eq!(addresszip.hits_async().await, 1);
        assert_eq!(search.hits_async().await, 1);

        proxy_handle.abort();
    }

    #[tokio::test]
    async fn upstream_errors_are_relayed_with_status() {
        let upstream = MockServer::start_async().await;
        mock_upstream_token(&upstream);
        upstream.mock(|when, then| {
            when.method(GET).path("/api/v1/searchcode/0000000");
            then.status(404).json_body(json!({
                "request_id": "6f1c1a8e-3f1e-4b43-9d55-0c6a2d6c2b11",
                "error_code": "404-1001",
                "message": "not found",
            }));
        });
        upstream.mock(|when, then| {
            when.method(POST).path("/api/v1/addresszip");
            then.status(503).body("<html>maintenance</html>");
        });

        let config = proxy_config(&upstream.base_url()).await;
        let (proxy_handle, proxy_addr) = spawn_proxy(&config).await;
        let latte = proxy_client(proxy_addr);
        let bearer = latte.get_token().await.unwrap();

        let err = latte
            .search(&bearer, "0000000", &SearchCodeRequest::default())
            .await
            .unwrap_err();
        match err {
            LatteError::ApiCallFailed {
                error_code, status, ..
            } => {
                assert_eq!(error_code, "404-1001");
                assert_eq!(status, Some(404));
            }
            other => panic!("unexpected {:?}", other),
        }

        // unparseable upstream 5xx becomes a proxy-shaped 503 with 500-0001
        let err = latte.address_zip(&bearer, &AddressZipRequest::default()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(err.error_code(), Some("500-0001"));
        assert!(matches!(err, LatteError::ProxyError { .. }));

        proxy_handle.abort();
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = listener.local_addr().unwrap();
        drop(listener);

        let config = proxy_config(&format!("http://{}", dead)).await;
        let (proxy_handle, proxy_addr) = spawn_proxy(&config).await;
        let latte = proxy_client(proxy_addr);

        let err = latte.token().await.unwrap_err();
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.error_code(), Some("502-0001"));

        proxy_handle.abort();
    }

    #[tokio::test]
    async fn metrics_are_served_when_enabled() {
        let upstream = MockServer::start_async().await;
        let config = proxy_config(&upstream.base_url()).await;
        let (proxy_handle, proxy_addr) = spawn_proxy(&config).await;

        let client = crate::tests::common::build_reqwest_client();
        client
            .post(format!("http://{}/proxytoken", proxy_addr))
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        let text = client
            .get(format!("http://{}/metrics", proxy_addr))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(text.contains("latte_proxy_tokens_issued_total"));

        proxy_handle.abort();
    }
}

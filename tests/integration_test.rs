//! Integration tests for petrel

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod config_tests {
    use super::*;
    use petrel::config::Config;
    use petrel::error::ConfigError;

    fn write_config(dir: &TempDir, yaml: &str) -> std::path::PathBuf {
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn test_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
odoo:
  base_url: "https://erp.example.com"
  api_key: "key"
  login: "etl"
  password: "secret"
  db_name: "production"

bigquery:
  project_id: "analytics-project"
  dataset_id: "erp_mirror"
  bucket_name: "gs://staging-bucket"
"#,
        );

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.odoo.base_url, "https://erp.example.com");
        assert_eq!(config.bigquery.project_id, "analytics-project");
        assert_eq!(config.bigquery.endpoint, "https://bigquery.googleapis.com");
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_config_interpolates_env_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
odoo:
  base_url: "https://erp.example.com"
  api_key: "${PETREL_IT_API_KEY:-key-from-default}"
  login: "etl"
  password: "secret"
  db_name: "production"

bigquery:
  project_id: "analytics-project"
  dataset_id: "erp_mirror"
  bucket_name: "gs://staging-bucket"
"#,
        );

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.odoo.api_key, "key-from-default");
    }

    #[test]
    fn test_config_rejects_unset_env_without_default() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
odoo:
  base_url: "https://erp.example.com"
  api_key: "${PETREL_IT_DEFINITELY_UNSET}"
  login: "etl"
  password: "secret"
  db_name: "production"

bigquery:
  project_id: "analytics-project"
  dataset_id: "erp_mirror"
  bucket_name: "gs://staging-bucket"
"#,
        );

        let error = Config::from_file(&path).unwrap_err();
        assert!(matches!(error, ConfigError::EnvInterpolation { .. }));
    }

    #[test]
    fn test_config_rejects_empty_project_id() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
odoo:
  base_url: "https://erp.example.com"
  api_key: "key"
  login: "etl"
  password: "secret"
  db_name: "production"

bigquery:
  project_id: ""
  dataset_id: "erp_mirror"
  bucket_name: "gs://staging-bucket"
"#,
        );

        let error = Config::from_file(&path).unwrap_err();
        assert!(matches!(error, ConfigError::EmptyProjectId));
    }
}

mod storage_tests {
    use petrel::storage::BackendConfig;

    #[test]
    fn test_gcs_url_parsing() {
        let config = BackendConfig::parse_url("gs://mybucket/staging").unwrap();
        match config {
            BackendConfig::Gcs(gcs) => {
                assert_eq!(gcs.bucket, "mybucket");
                assert_eq!(gcs.key.as_ref().map(|k| k.as_ref()), Some("staging"));
            }
            _ => panic!("Expected GCS config"),
        }
    }

    #[test]
    fn test_local_path_parsing() {
        let config = BackendConfig::parse_url("/var/petrel/staging").unwrap();
        match config {
            BackendConfig::Local(local) => {
                assert_eq!(local.path, "/var/petrel/staging");
            }
            _ => panic!("Expected Local config"),
        }
    }

    #[test]
    fn test_file_url_parsing() {
        let config = BackendConfig::parse_url("file:///var/petrel/staging").unwrap();
        match config {
            BackendConfig::Local(local) => {
                assert_eq!(local.path, "/var/petrel/staging");
            }
            _ => panic!("Expected Local config"),
        }
    }

    #[test]
    fn test_unsupported_url_rejected() {
        let result = BackendConfig::parse_url("s3://bucket/unsupported");
        assert!(result.is_err());
    }
}

mod source_tests {
    use super::*;
    use petrel::config::OdooConfig;
    use petrel::error::FetchError;
    use petrel::record::entities;
    use petrel::source::OdooClient;

    fn client_for(server: &MockServer) -> OdooClient {
        OdooClient::new(OdooConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            login: "svc".to_string(),
            password: "secret".to_string(),
            db_name: "production".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_credentials_in_query_and_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/send_request"))
            .and(query_param("model", "res.partner"))
            .and(query_param("login", "svc"))
            .and(query_param("password", "secret"))
            .and(query_param("api-key", "test-key"))
            .and(query_param("db", "production"))
            .and(query_param("Content-Type", "application/json"))
            .and(header("login", "svc"))
            .and(header("password", "secret"))
            .and(header("api-key", "test-key"))
            .and(header("db", "production"))
            .and(body_partial_json(json!({
                "fields": [
                    "name",
                    "cust_category_id",
                    "contact_type",
                    "stop_supply",
                    "write_date",
                    "create_date"
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [{"id": 7, "name": "Acme Co"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let entity = entities::find("contacts").unwrap();
        let records = client_for(&server).try_fetch(entity).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], json!("Acme Co"));
    }

    #[tokio::test]
    async fn test_fetch_degrades_to_empty_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/send_request"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let entity = entities::find("sales_orders").unwrap();
        let records = client_for(&server).fetch(entity).await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_try_fetch_propagates_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/send_request"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let entity = entities::find("sales_orders").unwrap();
        let error = client_for(&server).try_fetch(entity).await.unwrap_err();
        assert!(matches!(error, FetchError::Request { .. }));
    }

    #[tokio::test]
    async fn test_fetch_tolerates_missing_records_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/send_request"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
            .mount(&server)
            .await;

        let entity = entities::find("contacts").unwrap();
        let records = client_for(&server).try_fetch(entity).await.unwrap();
        assert!(records.is_empty());
    }
}

mod loader_tests {
    use super::*;
    use petrel::config::BigQueryConfig;
    use petrel::error::LoadError;
    use petrel::warehouse::BulkLoader;

    fn loader_for(server: &MockServer) -> BulkLoader {
        BulkLoader::new(&BigQueryConfig {
            project_id: "analytics-project".to_string(),
            dataset_id: "erp_mirror".to_string(),
            bucket_name: "gs://staging-bucket".to_string(),
            endpoint: server.uri(),
            auth_token: Some("test-token".to_string()),
        })
        .unwrap()
    }

    fn columns() -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    #[tokio::test]
    async fn test_load_submits_job_and_polls_until_done() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bigquery/v2/projects/analytics-project/jobs"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({
                "configuration": {
                    "load": {
                        "destinationTable": {
                            "projectId": "analytics-project",
                            "datasetId": "erp_mirror",
                            "tableId": "contacts"
                        },
                        "sourceUris": ["gs://staging-bucket/temp/contacts_data.json"],
                        "sourceFormat": "NEWLINE_DELIMITED_JSON",
                        "writeDisposition": "WRITE_TRUNCATE",
                        "schema": {
                            "fields": [
                                {"name": "id", "type": "STRING"},
                                {"name": "name", "type": "STRING"}
                            ]
                        }
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobReference": {
                    "projectId": "analytics-project",
                    "jobId": "job_1",
                    "location": "EU"
                },
                "status": {"state": "RUNNING"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/bigquery/v2/projects/analytics-project/jobs/job_1"))
            .and(query_param("location", "EU"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobReference": {"projectId": "analytics-project", "jobId": "job_1"},
                "status": {"state": "DONE"},
                "statistics": {"load": {"outputRows": "250"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rows = loader_for(&server)
            .load(
                "contacts",
                "gs://staging-bucket/temp/contacts_data.json",
                &columns(),
            )
            .await
            .unwrap();
        assert_eq!(rows, 250);
    }

    #[tokio::test]
    async fn test_load_reports_job_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bigquery/v2/projects/analytics-project/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobReference": {"projectId": "analytics-project", "jobId": "job_2"},
                "status": {
                    "state": "DONE",
                    "errorResult": {
                        "reason": "accessDenied",
                        "message": "Access Denied: bucket not readable"
                    }
                }
            })))
            .mount(&server)
            .await;

        let error = loader_for(&server)
            .load(
                "contacts",
                "gs://staging-bucket/temp/contacts_data.json",
                &columns(),
            )
            .await
            .unwrap_err();

        match error {
            LoadError::JobFailed { table, detail } => {
                assert_eq!(table, "contacts");
                assert!(detail.contains("Access Denied"));
            }
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_errors_when_reference_missing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bigquery/v2/projects/analytics-project/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let error = loader_for(&server)
            .load(
                "contacts",
                "gs://staging-bucket/temp/contacts_data.json",
                &columns(),
            )
            .await
            .unwrap_err();
        assert!(matches!(error, LoadError::MissingJobReference));
    }

    #[tokio::test]
    async fn test_load_surfaces_api_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/bigquery/v2/projects/analytics-project/jobs"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let error = loader_for(&server)
            .load(
                "contacts",
                "gs://staging-bucket/temp/contacts_data.json",
                &columns(),
            )
            .await
            .unwrap_err();

        match error {
            LoadError::JobApi { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("quota"));
            }
            other => panic!("expected JobApi, got {other:?}"),
        }
    }
}

mod pipeline_tests {
    use super::*;
    use petrel::config::{BigQueryConfig, Config, MetricsConfig, OdooConfig};
    use petrel::error::PipelineError;
    use petrel::pipeline::run_pipeline;

    fn test_config(odoo: &MockServer, bigquery: &MockServer, bucket: &TempDir) -> Config {
        Config {
            odoo: OdooConfig {
                base_url: odoo.uri(),
                api_key: "test-key".to_string(),
                login: "svc".to_string(),
                password: "secret".to_string(),
                db_name: "production".to_string(),
            },
            bigquery: BigQueryConfig {
                project_id: "analytics-project".to_string(),
                dataset_id: "erp_mirror".to_string(),
                bucket_name: bucket.path().to_str().unwrap().to_string(),
                endpoint: bigquery.uri(),
                auth_token: Some("test-token".to_string()),
            },
            metrics: MetricsConfig {
                enabled: false,
                address: "127.0.0.1:0".to_string(),
            },
        }
    }

    async fn mount_empty_fallback(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/send_request"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
            .mount(server)
            .await;
    }

    fn done_job(rows: &str) -> serde_json::Value {
        json!({
            "jobReference": {"projectId": "analytics-project", "jobId": "job_1"},
            "status": {"state": "DONE"},
            "statistics": {"load": {"outputRows": rows}}
        })
    }

    #[tokio::test]
    async fn test_end_to_end_single_entity() {
        let odoo = MockServer::start().await;
        let bigquery = MockServer::start().await;
        let bucket = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/send_request"))
            .and(query_param("model", "sale.order"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [
                    {
                        "id": 1,
                        "name": "S00001",
                        "date_order": "2024-03-15 10:30:00",
                        "partner_id": [7, "Acme Co"],
                        "amount_total": 1287.5,
                        "state": "sale"
                    },
                    {
                        "id": 2,
                        "name": "S00002",
                        "partner_id": false,
                        "amount_total": 99,
                        "state": "draft"
                    }
                ]
            })))
            .mount(&odoo)
            .await;
        mount_empty_fallback(&odoo).await;

        Mock::given(method("POST"))
            .and(path("/bigquery/v2/projects/analytics-project/jobs"))
            .and(body_partial_json(json!({
                "configuration": {
                    "load": {
                        "destinationTable": {"tableId": "sales_orders"},
                        "writeDisposition": "WRITE_TRUNCATE"
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(done_job("2")))
            .expect(1)
            .mount(&bigquery)
            .await;

        let stats = run_pipeline(test_config(&odoo, &bigquery, &bucket))
            .await
            .unwrap();

        assert_eq!(stats.entities_loaded, 1);
        assert_eq!(stats.entities_skipped, 8);
        assert_eq!(stats.records_fetched, 2);
        assert_eq!(stats.rows_loaded, 2);
        assert!(stats.bytes_staged > 0);

        let staged =
            std::fs::read_to_string(bucket.path().join("temp/sales_orders_data.json")).unwrap();
        let rows: Vec<serde_json::Value> = staged
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0]["id"], json!("1"));
        assert_eq!(rows[0]["name"], json!("S00001"));
        assert_eq!(rows[0]["date_order"], json!("2024-03-15T10:30:00.000000Z"));
        assert_eq!(rows[0]["partner_id"], json!("Acme Co"));
        assert_eq!(rows[0]["amount_total"], json!("1287.5"));
        // Absent source fields still produce their column, as null.
        assert!(rows[0].as_object().unwrap().contains_key("invoice_status"));
        assert_eq!(rows[0]["invoice_status"], serde_json::Value::Null);

        assert_eq!(rows[1]["id"], json!("2"));
        assert_eq!(rows[1]["partner_id"], serde_json::Value::Null);
        assert_eq!(rows[1]["amount_total"], json!("99"));
    }

    #[tokio::test]
    async fn test_aborts_when_load_fails() {
        let odoo = MockServer::start().await;
        let bigquery = MockServer::start().await;
        let bucket = TempDir::new().unwrap();

        // Two models have data; the failed first load must stop the run
        // before the second entity is submitted.
        for model in ["sale.order", "res.partner"] {
            Mock::given(method("GET"))
                .and(path("/send_request"))
                .and(query_param("model", model))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "records": [{"id": 1, "name": "X"}]
                })))
                .mount(&odoo)
                .await;
        }
        mount_empty_fallback(&odoo).await;

        Mock::given(method("POST"))
            .and(path("/bigquery/v2/projects/analytics-project/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobReference": {"projectId": "analytics-project", "jobId": "job_1"},
                "status": {
                    "state": "DONE",
                    "errorResult": {"reason": "invalid", "message": "Could not parse row"}
                }
            })))
            .expect(1)
            .mount(&bigquery)
            .await;

        let error = run_pipeline(test_config(&odoo, &bigquery, &bucket))
            .await
            .unwrap_err();
        assert!(matches!(error, PipelineError::Load { .. }));
    }

    #[tokio::test]
    async fn test_all_entities_skipped_without_records() {
        let odoo = MockServer::start().await;
        let bigquery = MockServer::start().await;
        let bucket = TempDir::new().unwrap();

        mount_empty_fallback(&odoo).await;
        Mock::given(method("POST"))
            .and(path("/bigquery/v2/projects/analytics-project/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(done_job("0")))
            .expect(0)
            .mount(&bigquery)
            .await;

        let stats = run_pipeline(test_config(&odoo, &bigquery, &bucket))
            .await
            .unwrap();

        assert_eq!(stats.entities_loaded, 0);
        assert_eq!(stats.entities_skipped, 9);
        assert_eq!(stats.rows_loaded, 0);
    }

    #[tokio::test]
    async fn test_fetch_failures_skip_entities() {
        let odoo = MockServer::start().await;
        let bigquery = MockServer::start().await;
        let bucket = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/send_request"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&odoo)
            .await;
        Mock::given(method("POST"))
            .and(path("/bigquery/v2/projects/analytics-project/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(done_job("0")))
            .expect(0)
            .mount(&bigquery)
            .await;

        let stats = run_pipeline(test_config(&odoo, &bigquery, &bucket))
            .await
            .unwrap();

        assert_eq!(stats.entities_loaded, 0);
        assert_eq!(stats.entities_skipped, 9);
    }
}

fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use docupload_protocol::messages::{
        ChunkUploadResponse, ErrorBody, FileId, FinalizeUploadRequest, InitiateUploadRequest,
        InitiateUploadResponse, ProcessedDocument, UploadChunkRequest,
    };

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Makes `42` and `42.0` compare equal.
    ///
    /// The backend writes whole-number floats without a fraction; serde_json
    /// writes `f64` with one.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Parses a fixture into `T`, writes it back and compares the JSON.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  backend: {fixture}\n  client:  {reserialized}"
        );
        parsed
    }

    // --- Requests ---

    #[test]
    fn fixture_initiate_upload_request() {
        let req = roundtrip_test::<InitiateUploadRequest>("initiate_upload_request.json");
        // 25 MiB in 1 MiB chunks.
        let plan = docupload_transfer::plan(req.total_size, 1024 * 1024).unwrap();
        assert_eq!(plan.total_chunks(), req.total_chunks);
    }

    #[test]
    fn fixture_upload_chunk_request() {
        let req = roundtrip_test::<UploadChunkRequest>("upload_chunk_request.json");
        let raw = docupload_transfer::decode(&req.chunk_data).unwrap();
        assert!(raw.starts_with(b"%PDF-"));
        assert_eq!(docupload_transfer::encode(&raw), req.chunk_data);
    }

    #[test]
    fn fixture_finalize_upload_request() {
        roundtrip_test::<FinalizeUploadRequest>("finalize_upload_request.json");
    }

    // --- Responses ---

    #[test]
    fn fixture_initiate_upload_response() {
        let resp = roundtrip_test::<InitiateUploadResponse>("initiate_upload_response.json");
        assert!(!resp.upload_id.is_empty());
    }

    #[test]
    fn fixture_chunk_upload_response() {
        let ack = roundtrip_test::<ChunkUploadResponse>("chunk_upload_response.json");
        assert!(ack.is_complete);
        assert_eq!(ack.chunks_received, ack.total_chunks);
    }

    #[test]
    fn fixture_processed_document() {
        let doc = roundtrip_test::<ProcessedDocument>("processed_document.json");
        assert_eq!(doc.details.file_id, FileId::Number(42));
    }

    #[test]
    fn fixture_processed_document_text_id() {
        let doc = roundtrip_test::<ProcessedDocument>("processed_document_text_id.json");
        assert_eq!(doc.details.file_id, FileId::Text("a3f9c1d2".into()));
        assert_eq!(doc.details.file_id.to_string(), "a3f9c1d2");
    }

    // --- Errors ---

    #[test]
    fn fixture_error_size_rejection() {
        let body = roundtrip_test::<ErrorBody>("error_size_rejection.json");
        assert!(body.detail_text().starts_with("File too large"));
        assert!(body.suggestion.is_some());
    }

    #[test]
    fn fixture_error_validation() {
        let body = roundtrip_test::<ErrorBody>("error_validation.json");
        assert_eq!(body.detail_text(), "Field required");
        assert!(body.suggestion.is_none());
    }

    #[test]
    fn normalize_treats_int_and_float_alike() {
        assert_eq!(
            normalize_value(&serde_json::json!({"a": 65})),
            normalize_value(&serde_json::json!({"a": 65.0}))
        );
    }
}

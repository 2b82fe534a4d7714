fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use permaflow_protocol::constants::MessageType;
    use permaflow_protocol::envelope::Message;
    use permaflow_protocol::messages::{StartUploadRequest, UploadFailedEvent, WatchTxRequest};
    use permaflow_protocol::types::{OperationKind, ProgressRecord};
    use permaflow_transfer::UploadHandle;

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture file as raw JSON text.
    ///
    /// Fixtures are parsed from text (not via `serde_json::Value`) so
    /// that envelope payloads, which deserialize into `RawValue`, take
    /// the same path they take in production.
    fn load_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and
    /// compares the JSON values. Fixtures were captured from the legacy
    /// TypeScript client, so a mismatch means the Rust side drifted from
    /// what deployed consumers emit.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let text = load_fixture(name);
        let parsed: T = serde_json::from_str(&text)
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized: serde_json::Value = serde_json::to_string(&parsed)
            .and_then(|json| serde_json::from_str(&json))
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        let fixture: serde_json::Value = serde_json::from_str(&text)
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"));

        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  legacy: {fixture}\n  rust:   {reserialized}"
        );
    }

    // --- Payload types ---

    #[test]
    fn fixture_progress_record() {
        roundtrip_test::<ProgressRecord>("progress_record.json");
    }

    #[test]
    fn fixture_upload_handle() {
        roundtrip_test::<UploadHandle>("upload_handle.json");
    }

    #[test]
    fn fixture_upload_failed() {
        roundtrip_test::<UploadFailedEvent>("upload_failed.json");
    }

    #[test]
    fn fixture_watch_tx() {
        roundtrip_test::<WatchTxRequest>("watch_tx.json");
    }

    // --- Envelopes ---

    #[test]
    fn fixture_start_upload_envelope() {
        roundtrip_test::<Message>("start_upload.json");

        let message: Message =
            serde_json::from_str(&load_fixture("start_upload.json")).unwrap();
        assert_eq!(message.msg_type, MessageType::StartUpload);

        // The nested payload must parse into the typed request, and its
        // uploader field into a live handle.
        let request: StartUploadRequest = message.parse_payload().unwrap().unwrap();
        assert_eq!(request.data.len(), 10);
        let handle = UploadHandle::from_json(&request.uploader).unwrap();
        assert_eq!(handle.data_size(), 10);
        assert_eq!(handle.total_chunks(), 3);
    }

    #[test]
    fn fixture_error_envelope() {
        roundtrip_test::<Message>("error_message.json");

        let message: Message =
            serde_json::from_str(&load_fixture("error_message.json")).unwrap();
        assert_eq!(message.msg_type, MessageType::Error);
        let error = message.error.unwrap();
        assert_eq!(error.code, 400);
    }

    // --- Stable string values the chain already contains ---

    #[test]
    fn operation_names_match_onchain_tags() {
        for (op, wire) in [
            (OperationKind::ModelCreation, "Model Creation"),
            (
                OperationKind::OperatorRegistrationSave,
                "Operator Registration Save",
            ),
            (OperationKind::ModelFeePaymentSave, "Model Fee Payment Save"),
            (OperationKind::InferenceRequest, "Script Inference Request"),
            (OperationKind::InferenceResponse, "Script Inference Response"),
        ] {
            let json = serde_json::to_value(op).unwrap();
            assert_eq!(json, serde_json::Value::String(wire.into()));
        }
    }

    #[test]
    fn resumed_handle_from_failed_event_is_usable() {
        let event: UploadFailedEvent =
            serde_json::from_str(&load_fixture("upload_failed.json")).unwrap();
        let handle = UploadHandle::from_json(&event.uploader).unwrap();
        assert_eq!(handle.uploaded_chunks(), 1);
        assert!(!handle.is_complete());
    }
}

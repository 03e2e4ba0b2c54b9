fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use dubhub_protocol::api::{
        AccountResponse, LoginResponse, OtpResponse, OtpVerifyRequest, PaymentResponse,
        SignupCompleteRequest, StartTranslationResponse, StatusResponse, parse_error_body,
    };
    use dubhub_protocol::{
        ChunkHeader, JobStatus, OperationType, ProgressEvent, StartTranslationRequest,
        UploadMetadata,
    };

    /// Returns the path to the fixtures directory.
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

    /// Normalizes numbers so that `40` and `40.0` compare equal.
    ///
    /// The backend emits integral floats without a fraction; serde_json
    /// writes `f64` fields with one.
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

    /// Deserializes a fixture, re-serializes it and compares the JSON values.
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

    // --- Translation ---

    #[test]
    fn fixture_start_translation_request() {
        let req: StartTranslationRequest = roundtrip_test("start_translation_request.json");
        assert_eq!(req.project_type, OperationType::PersianDubbing);
        assert_eq!(req.video_size, 50 * 1024 * 1024);
    }

    #[test]
    fn fixture_start_translation_response() {
        let resp: StartTranslationResponse = roundtrip_test("start_translation_response.json");
        let started = resp.validate().expect("complete start response");
        assert_eq!(started.project_id, 17);
        assert_eq!(started.chunk_size, 1024 * 1024);
        assert!(started.upload_url.contains("/ws/upload/"));
        assert!(started.logs_url.contains("/ws/logs/"));
    }

    #[test]
    fn fixture_status_response() {
        let resp: StatusResponse = roundtrip_test("status_response.json");
        let data = resp.data.expect("status data");
        assert_eq!(JobStatus::from_wire(&data.status), JobStatus::Processing);
        assert_eq!(data.project_id, Some(17));
    }

    // --- Auth ---

    #[test]
    fn fixture_otp_verify_request() {
        roundtrip_test::<OtpVerifyRequest>("otp_verify_request.json");
    }

    #[test]
    fn fixture_signup_complete_request() {
        roundtrip_test::<SignupCompleteRequest>("signup_complete_request.json");
    }

    #[test]
    fn fixture_otp_response() {
        let resp: OtpResponse = roundtrip_test("otp_response.json");
        assert_eq!(resp.otp_id, "c0a8012e-7d1b");
    }

    #[test]
    fn fixture_login_response() {
        let resp: LoginResponse = roundtrip_test("login_response.json");
        assert_eq!(resp.user.map(|u| u.id), Some(12));
    }

    // --- Account & wallet ---

    #[test]
    fn fixture_account_response() {
        let resp: AccountResponse = roundtrip_test("account_response.json");
        let data = resp.data.expect("account data");
        assert_eq!(data.statistics.current_balance, 125_000.0);
    }

    #[test]
    fn fixture_payment_response() {
        let resp: PaymentResponse = roundtrip_test("payment_response.json");
        assert_eq!(
            resp.redirect_url.as_deref(),
            Some("https://gateway.example/pay/91")
        );
    }

    // --- Channels ---

    #[test]
    fn fixture_upload_metadata() {
        let meta: UploadMetadata = roundtrip_test("upload_metadata.json");
        assert_eq!(meta, UploadMetadata::new(".mp4"));
    }

    #[test]
    fn fixture_chunk_header() {
        let header: ChunkHeader = roundtrip_test("chunk_header.json");
        assert_eq!(header.offset, header.index * header.size);
    }

    #[test]
    fn fixture_event_frames() {
        let cases = load_fixture("event_frames.json");
        for case in cases.as_array().expect("array of cases") {
            let text = case["frame"].to_string();
            let event = ProgressEvent::parse(&text)
                .unwrap_or_else(|e| panic!("failed to parse {text}: {e}"));

            assert_eq!(event.kind(), case["kind"].as_str().unwrap(), "kind of {text}");
            assert_eq!(event.message(), case["message"].as_str(), "message of {text}");
            assert_eq!(
                event.percent().map(u64::from),
                case["percent"].as_u64(),
                "percent of {text}"
            );
        }
    }

    #[test]
    fn fixture_error_bodies() {
        let cases = load_fixture("error_bodies.json");
        for case in cases.as_array().expect("array of cases") {
            let body = case["body"].to_string();
            let detail = parse_error_body(&body)
                .unwrap_or_else(|| panic!("no error detail in {body}"));
            assert_eq!(detail.code.as_deref(), case["code"].as_str(), "code of {body}");
            assert_eq!(detail.message, case["message"].as_str().unwrap(), "message of {body}");
        }
    }
}

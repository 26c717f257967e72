//! HTTP interface to the numeric backend.
//!
//! Every request is a read-only GET with numeric query parameters. Any
//! response body may carry an `"error"` field instead of data; that is
//! reported as [`BackendResponse::Error`] rather than as a transport failure.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::Deserialize;
use serde_json::Value;

/// Query for a single-character scan of L(r + it).
#[derive(Debug, Clone, PartialEq)]
pub struct ScanQuery {
    pub real_part: f64,
    pub start: f64,
    pub end: f64,
    pub modulus: u64,
    pub character: usize,
    pub steps: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendRequest {
    Scan(ScanQuery),
    ScanAll {
        start: f64,
        end: f64,
        modulus: u64,
    },
    Clt {
        modulus: u64,
        character: usize,
        start: f64,
        end: f64,
        samples: usize,
    },
    Point {
        real_part: f64,
        imag: f64,
        modulus: u64,
    },
}

impl BackendRequest {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Scan(_) => "/scan",
            Self::ScanAll { .. } => "/scan_all",
            Self::Clt { .. } => "/clt",
            Self::Point { .. } => "/calc",
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Scan(q) => vec![
                ("r", q.real_part.to_string()),
                ("start", q.start.to_string()),
                ("end", q.end.to_string()),
                ("q", q.modulus.to_string()),
                ("idx", q.character.to_string()),
                ("steps", q.steps.to_string()),
            ],
            Self::ScanAll {
                start,
                end,
                modulus,
            } => vec![
                ("start", start.to_string()),
                ("end", end.to_string()),
                ("q", modulus.to_string()),
            ],
            Self::Clt {
                modulus,
                character,
                start,
                end,
                samples,
            } => vec![
                ("q", modulus.to_string()),
                ("idx", character.to_string()),
                ("start", start.to_string()),
                ("end", end.to_string()),
                ("samples", samples.to_string()),
            ],
            Self::Point {
                real_part,
                imag,
                modulus,
            } => vec![
                ("r", real_part.to_string()),
                ("i", imag.to_string()),
                ("q", modulus.to_string()),
            ],
        }
    }

    /// Path plus encoded query string, for logging and tests.
    pub fn describe(&self) -> String {
        let query = self
            .query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path(), query)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanPoint {
    pub t: f64,
    #[serde(alias = "real", alias = "value")]
    pub re: Option<f64>,
    #[serde(default, alias = "imag")]
    pub im: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSeries {
    pub label: String,
    /// `None` where the backend sent null (log of an exact zero).
    pub data: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanAll {
    pub t: Vec<f64>,
    pub datasets: Vec<LabeledSeries>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PointValue {
    pub result: String,
    pub modulus: u64,
    pub s_real: f64,
    pub s_imag: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Scan(Vec<ScanPoint>),
    ScanAll(ScanAll),
    Clt(Vec<f64>),
    Point(PointValue),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendResponse {
    Data(Payload),
    /// The backend answered with an explicit `error` field.
    Error(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScanBody {
    Wrapped { points: Vec<ScanPoint> },
    Bare(Vec<ScanPoint>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Label {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Deserialize)]
struct RawDataset {
    label: Label,
    data: Vec<Option<f64>>,
}

#[derive(Deserialize)]
struct ScanAllBody {
    t: Vec<f64>,
    datasets: Vec<RawDataset>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CltBody {
    Wrapped {
        #[serde(alias = "values")]
        samples: Vec<Option<f64>>,
    },
    Bare(Vec<Option<f64>>),
}

fn error_field(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Interpret a decoded response body for `request`.
pub fn parse_response(request: &BackendRequest, value: Value) -> Result<BackendResponse> {
    if let Some(message) = error_field(&value) {
        return Ok(BackendResponse::Error(message));
    }

    let payload = match request {
        BackendRequest::Scan(_) => match serde_json::from_value::<ScanBody>(value)? {
            ScanBody::Wrapped { points } | ScanBody::Bare(points) => Payload::Scan(points),
        },
        BackendRequest::ScanAll { .. } => {
            let body: ScanAllBody = serde_json::from_value(value)?;
            Payload::ScanAll(ScanAll {
                t: body.t,
                datasets: body
                    .datasets
                    .into_iter()
                    .map(|d| LabeledSeries {
                        label: match d.label {
                            Label::Text(s) => s,
                            Label::Number(n) => n.to_string(),
                        },
                        data: d.data,
                    })
                    .collect(),
            })
        }
        BackendRequest::Clt { .. } => {
            let samples = match serde_json::from_value::<CltBody>(value)? {
                CltBody::Wrapped { samples } | CltBody::Bare(samples) => samples,
            };
            Payload::Clt(
                samples
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect(),
            )
        }
        BackendRequest::Point { .. } => Payload::Point(serde_json::from_value(value)?),
    };
    Ok(BackendResponse::Data(payload))
}

/// Source of numeric data for the console.
///
/// `Err` means the request itself failed (transport or decoding).
pub trait Backend: Send + Sync {
    fn fetch(&self, request: &BackendRequest) -> Result<BackendResponse>;
}

/// Backend reached over HTTP with blocking GETs.
///
/// No timeout is set: scans of long ranges can take the backend a while.
pub struct HttpBackend {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, request: &BackendRequest) -> String {
        format!("{}{}", self.base_url, request.path())
    }
}

impl Backend for HttpBackend {
    fn fetch(&self, request: &BackendRequest) -> Result<BackendResponse> {
        let url = self.url_for(request);
        let mut call = self.agent.get(&url);
        for (key, value) in request.query_pairs() {
            call = call.query(key, &value);
        }

        match call.call() {
            Ok(response) => {
                let value: Value = serde_json::from_reader(response.into_reader())
                    .map_err(|e| eyre!("Invalid JSON from {}: {}", url, e))?;
                parse_response(request, value)
            }
            Err(ureq::Error::Status(code, response)) => {
                // error bodies may still explain themselves
                let explained = serde_json::from_reader::<_, Value>(response.into_reader())
                    .ok()
                    .and_then(|v| error_field(&v));
                match explained {
                    Some(message) => Ok(BackendResponse::Error(message)),
                    None => Err(eyre!("Backend returned HTTP {} for {}", code, url)),
                }
            }
            Err(e) => Err(eyre!("Request to {} failed: {}", url, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scan_all_request() -> BackendRequest {
        BackendRequest::ScanAll {
            start: 0.0,
            end: 100.0,
            modulus: 5,
        }
    }

    #[test]
    fn test_query_strings() {
        let req = BackendRequest::Scan(ScanQuery {
            real_part: 0.5,
            start: 0.0,
            end: 100.0,
            modulus: 5,
            character: 2,
            steps: 1000,
        });
        assert_eq!(
            req.describe(),
            "/scan?r=0.5&start=0&end=100&q=5&idx=2&steps=1000"
        );
        assert_eq!(scan_all_request().describe(), "/scan_all?start=0&end=100&q=5");
        let point = BackendRequest::Point {
            real_part: 0.5,
            imag: 14.1347,
            modulus: 1,
        };
        assert_eq!(point.describe(), "/calc?r=0.5&i=14.1347&q=1");
    }

    #[test]
    fn test_error_field_wins() {
        let resp = parse_response(
            &scan_all_request(),
            json!({"error": "modulus too large", "t": []}),
        )
        .unwrap();
        assert_eq!(resp, BackendResponse::Error("modulus too large".into()));
    }

    #[test]
    fn test_null_error_is_ignored() {
        let resp = parse_response(
            &scan_all_request(),
            json!({"error": null, "t": [1.0], "datasets": []}),
        )
        .unwrap();
        assert!(matches!(resp, BackendResponse::Data(Payload::ScanAll(_))));
    }

    #[test]
    fn test_scan_all_labels_and_nulls() {
        let resp = parse_response(
            &scan_all_request(),
            json!({
                "t": [0.0, 0.5],
                "datasets": [
                    {"label": 1, "data": [0.1, null]},
                    {"label": "2", "data": [0.2, 0.3]}
                ]
            }),
        )
        .unwrap();
        let BackendResponse::Data(Payload::ScanAll(all)) = resp else {
            panic!("expected scan_all payload");
        };
        assert_eq!(all.datasets[0].label, "1");
        assert_eq!(all.datasets[0].data, vec![Some(0.1), None]);
        assert_eq!(all.datasets[1].label, "2");
    }

    #[test]
    fn test_scan_shapes() {
        let req = BackendRequest::Scan(ScanQuery {
            real_part: 0.5,
            start: 0.0,
            end: 1.0,
            modulus: 1,
            character: 1,
            steps: 10,
        });
        let wrapped = parse_response(&req, json!({"points": [{"t": 0.0, "re": 1.5, "im": -0.5}]}))
            .unwrap();
        let bare = parse_response(&req, json!([{"t": 0.0, "real": 1.5, "imag": -0.5}])).unwrap();
        assert_eq!(wrapped, bare);

        let no_im = parse_response(&req, json!([{"t": 0.0, "value": 2.0}])).unwrap();
        let BackendResponse::Data(Payload::Scan(points)) = no_im else {
            panic!("expected scan payload");
        };
        assert_eq!(points[0].re, Some(2.0));
        assert_eq!(points[0].im, None);
    }

    #[test]
    fn test_clt_nulls_become_nan() {
        let req = BackendRequest::Clt {
            modulus: 1,
            character: 1,
            start: 1000.0,
            end: 2000.0,
            samples: 3,
        };
        let resp = parse_response(&req, json!({"values": [0.5, null, -999.0]})).unwrap();
        let BackendResponse::Data(Payload::Clt(v)) = resp else {
            panic!("expected clt payload");
        };
        assert_eq!(v.len(), 3);
        assert!(v[1].is_nan());
        assert_eq!(v[2], -999.0);
    }

    #[test]
    fn test_point_payload() {
        let req = BackendRequest::Point {
            real_part: 0.5,
            imag: 14.1347,
            modulus: 1,
        };
        let resp = parse_response(
            &req,
            json!({"result": "0.000001 + -0.000002i", "modulus": 1, "s_real": 0.5, "s_imag": 14.1347}),
        )
        .unwrap();
        let BackendResponse::Data(Payload::Point(p)) = resp else {
            panic!("expected point payload");
        };
        assert_eq!(p.result, "0.000001 + -0.000002i");
    }

    #[test]
    fn test_malformed_body_is_err() {
        assert!(parse_response(&scan_all_request(), json!({"t": "nope"})).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8080/");
        assert_eq!(
            backend.url_for(&scan_all_request()),
            "http://localhost:8080/scan_all"
        );
    }
}

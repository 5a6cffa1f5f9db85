//! Detection data model and the single-best-detection response contract

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Raw (class id, confidence fraction) pair from the detector.
///
/// Confidence is a fraction in [0, 1] and is already filtered by the
/// detector against the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub confidence: f32,
}

impl Candidate {
    pub fn new(class_id: usize, confidence: f32) -> Self {
        Self {
            class_id,
            confidence,
        }
    }
}

/// A mapped, human-readable detection.
///
/// Created fresh per inference call and discarded after the response is
/// sent; there is no persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Hazard class label (e.g. "pothole")
    #[serde(rename = "type")]
    pub hazard_type: String,
    /// Confidence as a percentage in [0, 100], rounded to 2 decimals
    pub confidence: f64,
    /// Wall-clock time at mapping, seconds since the Unix epoch
    pub timestamp: f64,
}

impl Detection {
    /// Map a raw candidate confidence fraction to a detection.
    ///
    /// The timestamp is taken here, so two detections mapped from the same
    /// inference call carry their own timestamps.
    pub fn new(hazard_type: impl Into<String>, confidence_fraction: f32) -> Self {
        Self {
            hazard_type: hazard_type.into(),
            confidence: round_percent(confidence_fraction),
            timestamp: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
        }
    }
}

/// Scale a [0, 1] confidence fraction to a percentage rounded to 2 decimals.
pub fn round_percent(fraction: f32) -> f64 {
    (fraction as f64 * 100.0 * 100.0).round() / 100.0
}

/// Select the detection with maximum confidence.
///
/// Linear scan keeping a running best; a strictly greater confidence is
/// required to displace it, so ties resolve to the first-encountered
/// detection.
pub fn best_detection(detections: &[Detection]) -> Option<&Detection> {
    let mut best: Option<&Detection> = None;
    for detection in detections {
        match best {
            Some(current) if detection.confidence <= current.confidence => {}
            _ => best = Some(detection),
        }
    }
    best
}

/// Response contract for one inference call.
///
/// Invariant: in the `Detected` shape, the top-level type/confidence/
/// timestamp always equal the `all_detections` element with maximum
/// confidence (first-encountered on ties). The stream endpoint omits
/// `all_detections`; the image endpoint carries a `message` when nothing
/// was detected.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DetectionReport {
    Detected {
        detected: bool,
        #[serde(rename = "type")]
        hazard_type: String,
        confidence: f64,
        timestamp: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        all_detections: Option<Vec<Detection>>,
    },
    Empty {
        detected: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl DetectionReport {
    /// Build a report from mapped detections, carrying the full list.
    pub fn with_all(detections: Vec<Detection>, empty_message: impl Into<String>) -> Self {
        match best_detection(&detections) {
            Some(best) => DetectionReport::Detected {
                detected: true,
                hazard_type: best.hazard_type.clone(),
                confidence: best.confidence,
                timestamp: best.timestamp,
                all_detections: Some(detections),
            },
            None => DetectionReport::Empty {
                detected: false,
                message: Some(empty_message.into()),
            },
        }
    }

    /// Build a report carrying only the best detection.
    pub fn best_only(detections: Vec<Detection>) -> Self {
        match best_detection(&detections) {
            Some(best) => DetectionReport::Detected {
                detected: true,
                hazard_type: best.hazard_type.clone(),
                confidence: best.confidence,
                timestamp: best.timestamp,
                all_detections: None,
            },
            None => DetectionReport::Empty {
                detected: false,
                message: None,
            },
        }
    }

    pub fn detected(&self) -> bool {
        match self {
            DetectionReport::Detected { detected, .. } => *detected,
            DetectionReport::Empty { detected, .. } => *detected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(hazard_type: &str, confidence: f64) -> Detection {
        Detection {
            hazard_type: hazard_type.to_string(),
            confidence,
            timestamp: 1_700_000_000.0,
        }
    }

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(0.95), 95.0);
        assert_eq!(round_percent(0.12345), 12.35);
        assert_eq!(round_percent(0.0), 0.0);
        assert_eq!(round_percent(1.0), 100.0);
    }

    #[test]
    fn test_round_percent_bounds() {
        for fraction in [0.0f32, 0.001, 0.5, 0.999, 1.0] {
            let pct = round_percent(fraction);
            assert!((0.0..=100.0).contains(&pct));
            // Rounded to 2 decimals: scaling by 100 lands on an integer
            assert!(((pct * 100.0).round() - pct * 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_detection_new_takes_current_timestamp() {
        let before = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        let detection = Detection::new("pothole", 0.91);
        let after = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        assert!(detection.timestamp >= before);
        assert!(detection.timestamp <= after);
        assert_eq!(detection.hazard_type, "pothole");
        assert_eq!(detection.confidence, 91.0);
    }

    #[test]
    fn test_best_detection_argmax() {
        let detections = vec![det("pothole", 91.0), det("crack", 95.0), det("debris", 40.5)];
        let best = best_detection(&detections).unwrap();
        assert_eq!(best.hazard_type, "crack");
        assert_eq!(best.confidence, 95.0);
    }

    #[test]
    fn test_best_detection_tie_keeps_first() {
        let detections = vec![det("debris", 80.0), det("flood", 80.0), det("pothole", 79.99)];
        let best = best_detection(&detections).unwrap();
        assert_eq!(best.hazard_type, "debris");
    }

    #[test]
    fn test_best_detection_empty() {
        assert!(best_detection(&[]).is_none());
    }

    #[test]
    fn test_report_with_all_matches_argmax() {
        let detections = vec![det("pothole", 91.0), det("crack", 95.0)];
        let report = DetectionReport::with_all(detections.clone(), "No hazards detected");
        match report {
            DetectionReport::Detected {
                detected,
                hazard_type,
                confidence,
                all_detections,
                ..
            } => {
                assert!(detected);
                assert_eq!(hazard_type, "crack");
                assert_eq!(confidence, 95.0);
                assert_eq!(all_detections.unwrap(), detections);
            }
            DetectionReport::Empty { .. } => panic!("expected detected shape"),
        }
    }

    #[test]
    fn test_report_with_all_empty_shape() {
        let report = DetectionReport::with_all(vec![], "No hazards detected");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "detected": false,
                "message": "No hazards detected",
            })
        );
    }

    #[test]
    fn test_report_best_only_empty_shape() {
        let report = DetectionReport::best_only(vec![]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value, serde_json::json!({ "detected": false }));
    }

    #[test]
    fn test_report_best_only_omits_all_detections() {
        let report = DetectionReport::best_only(vec![det("accident", 66.6)]);
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("all_detections").is_none());
        assert_eq!(value["detected"], serde_json::json!(true));
        assert_eq!(value["type"], serde_json::json!("accident"));
        assert_eq!(value["confidence"], serde_json::json!(66.6));
    }

    #[test]
    fn test_detection_serializes_type_key() {
        let value = serde_json::to_value(det("roadblock", 50.0)).unwrap();
        assert_eq!(value["type"], serde_json::json!("roadblock"));
        assert!(value.get("hazard_type").is_none());
    }
}

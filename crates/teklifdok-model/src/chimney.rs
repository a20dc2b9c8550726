//! Chimney (baca) records and their measured parameter sets.

use serde::{Deserialize, Serialize};

/// One measured parameter under a chimney, as a label/value list.
///
/// Values are kept as an ordered list of pairs rather than a map: the
/// detail block composer renders remaining keys in encounter order, so
/// the order the record was authored in must survive deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterReading {
    /// Parameter name (e.g. "TOZ", "YANMA GAZLARI")
    pub parametre: String,
    /// Measured label/value pairs
    #[serde(default)]
    pub degerler: Vec<(String, String)>,
}

impl ParameterReading {
    pub fn new(parametre: impl Into<String>) -> Self {
        Self {
            parametre: parametre.into(),
            degerler: Vec::new(),
        }
    }

    /// Look up a value by its label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.degerler
            .iter()
            .find(|(k, _)| k == label)
            .map(|(_, v)| v.as_str())
    }
}

/// A chimney record with its measured parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chimney {
    /// Chimney name (e.g. "BACA-1")
    pub baca_adi: String,
    #[serde(default)]
    pub parametreler: Vec<ParameterReading>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_order_preserved() {
        let json = r#"{
            "parametre": "TOZ",
            "degerler": [
                ["Baca Gazı Hızı", "12.4 m/s"],
                ["Sıcaklık", "148 °C"],
                ["Debi", "2.1 Nm³/h"]
            ]
        }"#;
        let reading: ParameterReading = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = reading.degerler.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Baca Gazı Hızı", "Sıcaklık", "Debi"]);
        assert_eq!(reading.get("Sıcaklık"), Some("148 °C"));
        assert_eq!(reading.get("Nem"), None);
    }
}

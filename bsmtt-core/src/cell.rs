//! Serving cell snapshot
//!
//! `CellData` is an immutable value. A refresh builds the next snapshot in
//! two steps, location fields first and signal fields second, and writes the
//! result back into the cell event.

use serde::{Deserialize, Serialize};

/// Radio access generation of the serving cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkGeneration {
    /// GSM, GPRS, EDGE, CDMA 1x
    #[serde(rename = "2g")]
    G2,
    /// UMTS, HSPA, EVDO
    #[serde(rename = "3g")]
    G3,
    /// LTE
    #[serde(rename = "4g")]
    G4,
    /// NR
    #[serde(rename = "5g")]
    G5,
    /// Radio did not report a technology
    Unknown,
}

impl NetworkGeneration {
    /// Map a radio network type name to its generation
    pub fn from_network_type(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "GPRS" | "EDGE" | "CDMA" | "1XRTT" | "IDEN" | "GSM" => Self::G2,
            "UMTS" | "EVDO_0" | "EVDO_A" | "EVDO_B" | "HSDPA" | "HSUPA" | "HSPA" | "HSPAP"
            | "EHRPD" | "TD_SCDMA" => Self::G3,
            "LTE" | "IWLAN" => Self::G4,
            "NR" => Self::G5,
            _ => Self::Unknown,
        }
    }
}

/// Location part of a cell observation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellLocation {
    /// Cell identity (CID for GSM/UMTS, base station id for CDMA)
    pub cell_id: Option<i64>,
    /// Location or tracking area code (LAC/TAC, network id for CDMA)
    pub area_code: Option<i64>,
}

/// Signal part of a cell observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSignal {
    /// Received signal strength in dBm
    pub signal_strength: Option<i32>,
    /// Radio generation
    pub generation: NetworkGeneration,
}

impl Default for CellSignal {
    fn default() -> Self {
        Self {
            signal_strength: None,
            generation: NetworkGeneration::Unknown,
        }
    }
}

/// Serving cell identity plus signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub cell_id: Option<i64>,
    pub area_code: Option<i64>,
    pub signal_strength: Option<i32>,
    pub network_generation: NetworkGeneration,
}

impl Default for CellData {
    fn default() -> Self {
        Self {
            cell_id: None,
            area_code: None,
            signal_strength: None,
            network_generation: NetworkGeneration::Unknown,
        }
    }
}

impl CellData {
    /// Next snapshot with the location fields replaced
    ///
    /// A location the radio could not resolve keeps the previous identity.
    pub fn with_location(&self, location: Option<&CellLocation>) -> Self {
        match location {
            Some(loc) => Self {
                cell_id: loc.cell_id,
                area_code: loc.area_code,
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    /// Next snapshot with the signal fields replaced
    pub fn with_signal(&self, signal: Option<&CellSignal>) -> Self {
        match signal {
            Some(sig) => Self {
                signal_strength: sig.signal_strength,
                network_generation: sig.generation,
                ..self.clone()
            },
            None => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_step_merge() {
        let base = CellData::default();
        let located = base.with_location(Some(&CellLocation {
            cell_id: Some(4021),
            area_code: Some(310),
        }));
        let merged = located.with_signal(Some(&CellSignal {
            signal_strength: Some(-87),
            generation: NetworkGeneration::G4,
        }));

        assert_eq!(merged.cell_id, Some(4021));
        assert_eq!(merged.area_code, Some(310));
        assert_eq!(merged.signal_strength, Some(-87));
        assert_eq!(merged.network_generation, NetworkGeneration::G4);
        // Inputs untouched
        assert_eq!(base, CellData::default());
    }

    #[test]
    fn missing_parts_keep_previous_values() {
        let data = CellData {
            cell_id: Some(1),
            area_code: Some(2),
            signal_strength: Some(-100),
            network_generation: NetworkGeneration::G3,
        };
        assert_eq!(data.with_location(None).with_signal(None), data);
    }

    #[test]
    fn generation_mapping() {
        assert_eq!(NetworkGeneration::from_network_type("edge"), NetworkGeneration::G2);
        assert_eq!(NetworkGeneration::from_network_type("HSPAP"), NetworkGeneration::G3);
        assert_eq!(NetworkGeneration::from_network_type("LTE"), NetworkGeneration::G4);
        assert_eq!(NetworkGeneration::from_network_type("NR"), NetworkGeneration::G5);
        assert_eq!(NetworkGeneration::from_network_type("?"), NetworkGeneration::Unknown);
    }

    #[test]
    fn serializes_generation_as_label() {
        let json = serde_json::to_value(CellData {
            network_generation: NetworkGeneration::G4,
            ..CellData::default()
        })
        .unwrap();
        assert_eq!(json["networkGeneration"], "4g");
        assert!(json["cellId"].is_null());
    }
}

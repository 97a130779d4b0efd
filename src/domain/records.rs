//! Source records: the shape in which a data source hands over the forest.
//!
//! Field names follow the clearing workstation's export format, so a dump of
//! the workstation data (`fundName`, `custodyInstitution`,
//! `transferInstructionNumber`, `tradeOrderNumber`, `instructionStatus`)
//! deserializes as-is. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Top-level document: either a bare list of funds or `{ "funds": [...] }`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ForestDocument {
    Funds(Vec<FundRecord>),
    Wrapped { funds: Vec<FundRecord> },
}

impl ForestDocument {
    pub fn into_funds(self) -> Vec<FundRecord> {
        match self {
            ForestDocument::Funds(funds) | ForestDocument::Wrapped { funds } => funds,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundRecord {
    pub id: String,
    #[serde(default, alias = "fundName", alias = "name")]
    pub label: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub children: Vec<CustodyRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustodyRecord {
    pub id: String,
    #[serde(default, alias = "custodyInstitution", alias = "name")]
    pub label: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub children: Vec<InstructionRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstructionRecord {
    pub id: String,
    #[serde(default, alias = "transferInstructionNumber", alias = "name")]
    pub label: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub children: Vec<TradeOrderRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradeOrderRecord {
    pub id: String,
    #[serde(default, alias = "tradeOrderNumber", alias = "name")]
    pub label: String,
    #[serde(default)]
    pub selected: bool,
    /// Free-text status, mapped to eligibility by the builder
    #[serde(default, alias = "instructionStatus")]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_workstation_json_when_deserializing_then_reads_aliased_fields() {
        let json = r#"[{
            "id": "1", "nodeType": "fund", "selected": false, "fundName": "Money Market A",
            "children": [{
                "id": "1-1", "custodyInstitution": "Shanghai Clearing House",
                "children": [{
                    "id": "1-1-1", "transferInstructionNumber": "000000000001001001",
                    "children": [{
                        "id": "1-1-1-1", "tradeOrderNumber": "22222222222222222222",
                        "instructionStatus": "未生成", "settlementAmount": 12000000
                    }]
                }]
            }]
        }]"#;

        let funds = serde_json::from_str::<ForestDocument>(json).unwrap().into_funds();

        assert_eq!(funds.len(), 1);
        assert_eq!(funds[0].label, "Money Market A");
        let order = &funds[0].children[0].children[0].children[0];
        assert_eq!(order.label, "22222222222222222222");
        assert_eq!(order.status, "未生成");
        assert!(!order.selected);
    }

    #[test]
    fn given_wrapped_document_when_deserializing_then_unwraps_funds() {
        let json = r#"{"funds": [{"id": "1"}, {"id": "2"}]}"#;
        let funds = serde_json::from_str::<ForestDocument>(json).unwrap().into_funds();
        assert_eq!(funds.len(), 2);
        assert!(funds[1].children.is_empty());
    }
}

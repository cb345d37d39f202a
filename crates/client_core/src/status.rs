//! Raw backend status → display category lookup.

use serde::Serialize;
use shared::domain::status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorCategory {
    Success,
    InProgress,
    Pending,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconCategory {
    Completed,
    InTransit,
    Waiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StatusCategory {
    pub color: ColorCategory,
    pub icon: IconCategory,
}

impl StatusCategory {
    const fn new(color: ColorCategory, icon: IconCategory) -> Self {
        Self { color, icon }
    }
}

pub const DEFAULT_STATUS_CATEGORY: StatusCategory =
    StatusCategory::new(ColorCategory::Neutral, IconCategory::Waiting);

const STATUS_TABLE: &[(&str, StatusCategory)] = &[
    (
        status::COMPLETED,
        StatusCategory::new(ColorCategory::Success, IconCategory::Completed),
    ),
    (
        status::ACTIVE,
        StatusCategory::new(ColorCategory::Success, IconCategory::Waiting),
    ),
    (
        status::ANALYSING,
        StatusCategory::new(ColorCategory::InProgress, IconCategory::Waiting),
    ),
    (
        status::IN_TRANSIT,
        StatusCategory::new(ColorCategory::InProgress, IconCategory::InTransit),
    ),
    (
        status::APPLIED,
        StatusCategory::new(ColorCategory::Pending, IconCategory::Waiting),
    ),
    (
        status::PREPARING,
        StatusCategory::new(ColorCategory::Pending, IconCategory::Waiting),
    ),
];

pub fn derive_status(raw: &str) -> StatusCategory {
    STATUS_TABLE
        .iter()
        .find(|(known, _)| *known == raw)
        .map(|(_, category)| *category)
        .unwrap_or(DEFAULT_STATUS_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_map_to_their_categories() {
        assert_eq!(
            derive_status(status::COMPLETED),
            StatusCategory::new(ColorCategory::Success, IconCategory::Completed)
        );
        assert_eq!(
            derive_status(status::IN_TRANSIT),
            StatusCategory::new(ColorCategory::InProgress, IconCategory::InTransit)
        );
        assert_eq!(derive_status(status::ACTIVE).color, ColorCategory::Success);
        assert_eq!(derive_status(status::ANALYSING).icon, IconCategory::Waiting);
        assert_eq!(derive_status(status::APPLIED).color, ColorCategory::Pending);
        assert_eq!(derive_status(status::PREPARING).color, ColorCategory::Pending);
    }

    #[test]
    fn unknown_statuses_fall_back_to_default_pair() {
        for raw in ["", "shipped", "상담신청", "완료 ", "ACTIVE", "\u{0}"] {
            assert_eq!(derive_status(raw), DEFAULT_STATUS_CATEGORY, "raw={raw:?}");
        }
    }

    #[test]
    fn table_has_no_duplicate_keys() {
        for (index, (raw, _)) in STATUS_TABLE.iter().enumerate() {
            assert!(
                STATUS_TABLE[index + 1..].iter().all(|(other, _)| other != raw),
                "duplicate status {raw}"
            );
        }
    }
}

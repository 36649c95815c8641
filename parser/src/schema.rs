//! Column resolution for the telemetry header row.
//!
//! The source format has been renamed several times across recorder versions.
//! Every canonical [`Field`] lists the column names it has been published
//! under, newest first, and the header is resolved against that table exactly
//! once per document.

use strum::{EnumCount as _, IntoEnumIterator};
use strum_macros::{Display, EnumCount, EnumIter};
use tracing::trace;

use crate::SchemaError;

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
pub enum Field {
    EntityId,
    Team,
    Timestamp,
    PosX,
    PosY,
    PosZ,
    YawDegrees,
    Yaw,
    PitchDegrees,
    Pitch,
    Crouching,
    Airborne,
    Dead,
    Health,
    Shield,
    EquippedItem,
    EmblemForeground,
    EmblemBackground,
    Color1,
    Color2,
    Color3,
    Color4,
    Kills,
    Deaths,
    Assists,
    EventTag,
}

struct FieldDef {
    field: Field,
    aliases: &'static [&'static str],
    required: bool,
}

const fn required(field: Field, aliases: &'static [&'static str]) -> FieldDef {
    FieldDef {
        field,
        aliases,
        required: true,
    }
}

const fn optional(field: Field, aliases: &'static [&'static str]) -> FieldDef {
    FieldDef {
        field,
        aliases,
        required: false,
    }
}

/// Indexed by `Field as usize`; order must follow the enum declaration.
static FIELD_TABLE: [FieldDef; Field::COUNT] = [
    required(Field::EntityId, &["PlayerName", "Player", "Name"]),
    optional(Field::Team, &["Team", "TeamName", "TeamId"]),
    required(
        Field::Timestamp,
        &["GameTimeMs", "TimestampMs", "Timestamp", "TimeMs"],
    ),
    required(Field::PosX, &["PosX", "X"]),
    required(Field::PosY, &["PosY", "Y"]),
    required(Field::PosZ, &["PosZ", "Z"]),
    optional(Field::YawDegrees, &["YawDeg", "Yaw_deg"]),
    optional(Field::Yaw, &["Yaw", "YawRad"]),
    optional(Field::PitchDegrees, &["PitchDeg", "Pitch_deg"]),
    optional(Field::Pitch, &["Pitch", "PitchRad"]),
    optional(Field::Crouching, &["IsCrouching", "Crouching"]),
    optional(Field::Airborne, &["IsAirborne", "Airborne", "InAir"]),
    optional(Field::Dead, &["IsDead", "Dead"]),
    optional(Field::Health, &["Health", "Hp"]),
    optional(Field::Shield, &["Shield", "Shields"]),
    optional(
        Field::EquippedItem,
        &["CurrentWeapon", "Weapon", "EquippedItem"],
    ),
    optional(Field::EmblemForeground, &["EmblemForeground", "EmblemFg"]),
    optional(Field::EmblemBackground, &["EmblemBackground", "EmblemBg"]),
    optional(Field::Color1, &["PrimaryColor", "Color1"]),
    optional(Field::Color2, &["SecondaryColor", "Color2"]),
    optional(Field::Color3, &["TertiaryColor", "Color3"]),
    optional(Field::Color4, &["QuaternaryColor", "Color4"]),
    optional(Field::Kills, &["Kills"]),
    optional(Field::Deaths, &["Deaths"]),
    optional(Field::Assists, &["Assists"]),
    optional(Field::EventTag, &["Event", "EventTag"]),
];

impl Field {
    fn def(self) -> &'static FieldDef {
        &FIELD_TABLE[self as usize]
    }

    /// Accepted column names, newest first.
    pub fn aliases(self) -> &'static [&'static str] {
        self.def().aliases
    }

    pub fn is_required(self) -> bool {
        self.def().required
    }
}

/// Header resolved into a fixed field → column index map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [Option<usize>; Field::COUNT],
    width: usize,
}

impl ColumnMap {
    /// Resolve a header row. The first column may carry a UTF-8 BOM.
    pub fn resolve<S: AsRef<str>>(header: &[S]) -> Result<ColumnMap, SchemaError> {
        let names: Vec<&str> = header
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let name = name.as_ref();
                let name = if i == 0 {
                    name.trim_start_matches(BOM)
                } else {
                    name
                };
                name.trim()
            })
            .collect();

        let mut indices = [None; Field::COUNT];
        for field in Field::iter() {
            let found = field
                .aliases()
                .iter()
                .find_map(|alias| names.iter().position(|name| name == alias));

            match found {
                Some(idx) => {
                    trace!("column {field} -> {:?} (index {idx})", names[idx]);
                    indices[field as usize] = Some(idx);
                }
                None if field.is_required() => return Err(SchemaError { field }),
                None => {}
            }
        }

        Ok(ColumnMap {
            indices,
            width: names.len(),
        })
    }

    pub fn get(&self, field: Field) -> Option<usize> {
        self.indices[field as usize]
    }

    pub fn contains(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    /// Number of columns in the header. Shorter rows are rejected by the parser.
    pub fn width(&self) -> usize {
        self.width
    }
}

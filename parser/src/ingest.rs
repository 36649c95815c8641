use tracing::{Level, debug, span, trace};

use crate::record::{DEFAULT_EQUIPPED_ITEM, DEFAULT_TEAM, TelemetryRecord};
use crate::roster::{Entity, build_roster};
use crate::schema::{ColumnMap, Field};
use crate::types::{CombatStats, Cosmetics, EntityId, Orientation, Point3, StatusFlags, Vitals};
use crate::{ParseError, Result, Warning};

const DELIMITER: char = ',';
const QUOTE: char = '"';
/// The recorder writes booleans with .NET casing.
const TRUE_TOKEN: &str = "True";
const FALSE_TOKEN: &str = "False";

/// Output of a successful ingestion, records sorted by timestamp.
#[derive(Debug, Clone)]
pub struct ParsedMatch {
    pub records: Vec<TelemetryRecord>,
    pub entities: Vec<Entity>,
    pub warnings: Vec<Warning>,
    /// Data rows dropped for being shorter than the header or lacking an entity id.
    pub skipped_rows: usize,
}

/// Parse a delimited telemetry document.
///
/// Fails only when the header is unusable or no data row survives; cell-level
/// problems degrade to defaults and are reported in [`ParsedMatch::warnings`].
pub fn parse(text: &str) -> Result<ParsedMatch> {
    let span = span!(Level::DEBUG, "ingest");
    let _enter = span.enter();

    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());
    let (_, header_line) = lines.next().ok_or(ParseError::Empty)?;
    let header = split_fields(header_line);
    let columns = ColumnMap::resolve(&header)?;

    let mut records = Vec::new();
    let mut warnings = Vec::new();
    let mut skipped_rows = 0;

    for (line_no, line) in lines {
        let cells = split_fields(line);
        if cells.len() < columns.width() {
            trace!(
                "line {line_no}: {} fields, header has {}; skipping",
                cells.len(),
                columns.width()
            );
            skipped_rows += 1;
            continue;
        }

        let reader = RowReader {
            line: line_no,
            cells: &cells,
            columns: &columns,
            warnings: &mut warnings,
        };
        match reader.into_record() {
            Some(record) => records.push(record),
            None => {
                trace!("line {line_no}: empty entity id; skipping");
                skipped_rows += 1;
            }
        }
    }

    if records.is_empty() {
        return Err(ParseError::NoDataRows.into());
    }

    // Palette assignment follows source order, so the roster is built before sorting.
    let entities = build_roster(&records);
    records.sort_by_key(|record| record.timestamp_ms);

    debug!(
        "parsed {} records for {} entities ({} rows skipped, {} warnings)",
        records.len(),
        entities.len(),
        skipped_rows,
        warnings.len()
    );

    Ok(ParsedMatch {
        records,
        entities,
        warnings,
        skipped_rows,
    })
}

/// Split one line on the delimiter, treating double quotes as a toggle.
///
/// Quote characters are dropped. There is no escaped-quote support.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in line.chars() {
        match c {
            QUOTE => quoted = !quoted,
            DELIMITER if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

struct RowReader<'a> {
    line: usize,
    cells: &'a [String],
    columns: &'a ColumnMap,
    warnings: &'a mut Vec<Warning>,
}

impl<'a> RowReader<'a> {
    fn into_record(mut self) -> Option<TelemetryRecord> {
        let entity_id = self.text(Field::EntityId)?;
        let entity_id = EntityId::from(entity_id);

        let team = match self.text(Field::Team) {
            Some(team) => team.to_string(),
            None => DEFAULT_TEAM.to_string(),
        };

        let position = Point3 {
            x: self.float(Field::PosX, 0.0),
            y: self.float(Field::PosY, 0.0),
            // Source space is left-handed; render space flips Z.
            z: -self.float(Field::PosZ, 0.0),
        };

        let orientation = Orientation {
            yaw: self.angle(Field::YawDegrees, Field::Yaw),
            pitch: self.angle(Field::PitchDegrees, Field::Pitch),
        };

        let status = StatusFlags {
            crouching: self.flag(Field::Crouching),
            airborne: self.flag(Field::Airborne),
            dead: self.flag(Field::Dead),
        };

        let defaults = Vitals::default();
        let vitals = Vitals {
            health: self.float(Field::Health, defaults.health),
            shield: self.float(Field::Shield, defaults.shield),
        };

        let equipped_item = self
            .text(Field::EquippedItem)
            .unwrap_or(DEFAULT_EQUIPPED_ITEM)
            .to_string();

        let cosmetics = Cosmetics {
            emblem_foreground: self.int(Field::EmblemForeground),
            emblem_background: self.int(Field::EmblemBackground),
            colors: [
                self.int(Field::Color1),
                self.int(Field::Color2),
                self.int(Field::Color3),
                self.int(Field::Color4),
            ],
        };

        let combat_stats = CombatStats {
            kills: self.count(Field::Kills),
            deaths: self.count(Field::Deaths),
            assists: self.count(Field::Assists),
        };

        let event_tag = self.text(Field::EventTag).map(str::to_string);
        let timestamp_ms = self.timestamp();

        Some(TelemetryRecord {
            entity_id,
            team,
            timestamp_ms,
            position,
            orientation,
            status,
            vitals,
            equipped_item,
            cosmetics,
            combat_stats,
            event_tag,
        })
    }

    /// Trimmed, non-empty cell for `field`, if the column exists.
    fn text(&self, field: Field) -> Option<&'a str> {
        let cells: &'a [String] = self.cells;
        let idx = self.columns.get(field)?;
        let cell = cells.get(idx)?.trim();
        (!cell.is_empty()).then_some(cell)
    }

    fn coerce<T: std::str::FromStr>(&mut self, field: Field, default: T) -> T {
        let Some(cell) = self.text(field) else {
            return default;
        };
        match cell.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                self.warn(field, cell.to_string());
                default
            }
        }
    }

    fn warn(&mut self, field: Field, value: String) {
        let warning = Warning::RecordCoercion {
            line: self.line,
            field,
            value,
        };
        debug!("{warning}");
        self.warnings.push(warning);
    }

    fn float(&mut self, field: Field, default: f32) -> f32 {
        let value = self.coerce(field, default);
        if value.is_finite() {
            value
        } else {
            self.warn(field, value.to_string());
            default
        }
    }

    fn int(&mut self, field: Field) -> i32 {
        self.coerce(field, 0)
    }

    fn count(&mut self, field: Field) -> u32 {
        self.coerce(field, 0)
    }

    fn timestamp(&mut self) -> i64 {
        let Some(cell) = self.text(Field::Timestamp) else {
            return 0;
        };
        if let Ok(ms) = cell.parse::<i64>() {
            return ms;
        }
        // Some recorder builds emit fractional milliseconds.
        match cell.parse::<f64>() {
            Ok(ms) if ms.is_finite() => ms as i64,
            _ => {
                self.warn(Field::Timestamp, cell.to_string());
                0
            }
        }
    }

    fn flag(&mut self, field: Field) -> bool {
        match self.text(field) {
            Some(TRUE_TOKEN) => true,
            None | Some(FALSE_TOKEN) => false,
            Some(other) => {
                self.warn(field, other.to_string());
                false
            }
        }
    }

    /// Degrees column wins over the radians column; neither means 0.
    fn angle(&mut self, degrees: Field, radians: Field) -> f32 {
        if self.columns.contains(degrees) {
            self.float(degrees, 0.0).to_radians()
        } else if self.columns.contains(radians) {
            self.float(radians, 0.0)
        } else {
            0.0
        }
    }
}

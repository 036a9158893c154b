//! Typed working table: one `Record` per synthetic candidate plus wide per-judge results.
//!
//! Schema is checked once when a sheet is turned into a `Table`; afterwards all
//! access is by position and judge index, never by raw column name.

use std::collections::HashSet;
use std::path::Path;

use crate::errors::AppError;
use crate::store::sentinel::{
    attribute_from_cell, attribute_to_cell, parse_id, parse_score, Counterpart, Winner,
};
use crate::store::sheet::Sheet;

pub const ID_COLUMN: &str = "id";
pub const PRIMARY_ID_COLUMN: &str = "cv_1_id";
pub const COUNTERPART_ID_COLUMN: &str = "cv_2_id";
pub const SCORE_PREFIX: &str = "score~";
pub const WINNER_PREFIX: &str = "winner~";

const RESERVED_COLUMNS: [&str; 3] = [ID_COLUMN, PRIMARY_ID_COLUMN, COUNTERPART_ID_COLUMN];

/// One judge's cells for one record. `score == 0` means unscored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JudgeResult {
    pub score: u32,
    pub winner: Option<Winner>,
}

/// Progress of one record under one judge, derived from its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Pending,
    Scored,
    Compared,
}

impl JudgeResult {
    pub fn state(&self) -> RecordState {
        if self.winner.is_some() {
            RecordState::Compared
        } else if self.score != 0 {
            RecordState::Scored
        } else {
            RecordState::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based, assigned once when the table is created.
    pub id: u32,
    /// Pass-through columns, in header order of the base file.
    pub attributes: Vec<Option<String>>,
    pub counterpart: Option<Counterpart>,
    /// Aligned with `Table::judges`.
    pub results: Vec<JudgeResult>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    attribute_columns: Vec<String>,
    body_index: usize,
    judges: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    /// Builds a fresh table from a base sheet: sequential ids and empty results for `judges`.
    pub fn from_base(
        sheet: Sheet,
        body_column: &str,
        judges: &[String],
        path: &Path,
    ) -> Result<Self, AppError> {
        for reserved in RESERVED_COLUMNS {
            if sheet.column_index(reserved).is_some() {
                return Err(AppError::schema(
                    path,
                    format!("base file already has reserved column '{reserved}'"),
                ));
            }
        }
        if let Some(h) = sheet
            .headers
            .iter()
            .find(|h| h.starts_with(SCORE_PREFIX) || h.starts_with(WINNER_PREFIX))
        {
            return Err(AppError::schema(
                path,
                format!("base file already has result column '{h}'"),
            ));
        }
        let body_index = sheet
            .column_index(body_column)
            .ok_or_else(|| AppError::schema(path, format!("missing column '{body_column}'")))?;

        let records = sheet
            .rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| Record {
                id: i as u32 + 1,
                attributes: row.iter().map(|c| attribute_from_cell(c)).collect(),
                counterpart: None,
                results: vec![JudgeResult::default(); judges.len()],
            })
            .collect();

        Ok(Table {
            attribute_columns: sheet.headers,
            body_index,
            judges: judges.to_vec(),
            records,
        })
    }

    /// Parses a checkpoint sheet. Its columns and rows are authoritative.
    pub fn from_checkpoint(sheet: Sheet, body_column: &str, path: &Path) -> Result<Self, AppError> {
        let required = |name: &str| {
            sheet
                .column_index(name)
                .ok_or_else(|| AppError::schema(path, format!("missing column '{name}'")))
        };
        let id_idx = required(ID_COLUMN)?;
        let primary_idx = required(PRIMARY_ID_COLUMN)?;
        let counterpart_idx = required(COUNTERPART_ID_COLUMN)?;
        required(body_column)?;

        let mut judges = Vec::new();
        let mut judge_cols = Vec::new();
        for (idx, header) in sheet.headers.iter().enumerate() {
            if let Some(judge) = header.strip_prefix(SCORE_PREFIX) {
                let winner_idx = sheet
                    .column_index(&format!("{WINNER_PREFIX}{judge}"))
                    .ok_or_else(|| {
                        AppError::schema(path, format!("'{header}' has no matching winner column"))
                    })?;
                judges.push(judge.to_string());
                judge_cols.push((idx, winner_idx));
            } else if let Some(judge) = header.strip_prefix(WINNER_PREFIX) {
                if sheet.column_index(&format!("{SCORE_PREFIX}{judge}")).is_none() {
                    return Err(AppError::schema(
                        path,
                        format!("'{header}' has no matching score column"),
                    ));
                }
            }
        }

        let is_result_column = |idx: usize| {
            idx == id_idx
                || idx == primary_idx
                || idx == counterpart_idx
                || judge_cols.iter().any(|(s, w)| *s == idx || *w == idx)
        };
        let attribute_idx: Vec<usize> = (0..sheet.headers.len())
            .filter(|i| !is_result_column(*i))
            .collect();
        let attribute_columns: Vec<String> = attribute_idx
            .iter()
            .map(|i| sheet.headers[*i].clone())
            .collect();
        let body_index = attribute_columns
            .iter()
            .position(|c| c == body_column)
            .ok_or_else(|| AppError::schema(path, format!("'{body_column}' is a reserved column")))?;

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(sheet.rows.len());
        for (line, row) in sheet.rows.iter().enumerate() {
            let at = |what: String| AppError::schema(path, format!("row {}: {what}", line + 1));

            let id = parse_id(&row[id_idx])
                .ok_or_else(|| at(format!("invalid id '{}'", row[id_idx])))?;
            if !seen.insert(id) {
                return Err(at(format!("duplicate id {id}")));
            }
            if parse_id(&row[primary_idx]) != Some(id) {
                return Err(at(format!(
                    "{PRIMARY_ID_COLUMN} '{}' does not match id {id}",
                    row[primary_idx]
                )));
            }
            let counterpart = Counterpart::from_cell(&row[counterpart_idx]).map_err(&at)?;

            let results = judge_cols
                .iter()
                .map(|(score_idx, winner_idx)| {
                    let score = parse_score(&row[*score_idx]).ok_or_else(|| {
                        at(format!(
                            "invalid score '{}' in '{}'",
                            row[*score_idx], sheet.headers[*score_idx]
                        ))
                    })?;
                    Ok::<_, AppError>(JudgeResult {
                        score,
                        winner: Winner::from_cell(&row[*winner_idx]),
                    })
                })
                .collect::<Result<Vec<_>, AppError>>()?;

            records.push(Record {
                id,
                attributes: attribute_idx
                    .iter()
                    .map(|i| attribute_from_cell(&row[*i]))
                    .collect(),
                counterpart,
                results,
            });
        }

        Ok(Table {
            attribute_columns,
            body_index,
            judges,
            records,
        })
    }

    /// Adds empty result columns for judges the table does not know yet.
    /// Returns the names that were added.
    pub fn ensure_judges(&mut self, judges: &[String]) -> Vec<String> {
        let mut added = Vec::new();
        for judge in judges {
            if self.judge_index(judge).is_none() {
                self.judges.push(judge.clone());
                for record in &mut self.records {
                    record.results.push(JudgeResult::default());
                }
                added.push(judge.clone());
            }
        }
        added
    }

    /// Checkpoint layout: attributes, id, cv_1_id, cv_2_id, then score/winner per judge.
    pub fn to_sheet(&self) -> Sheet {
        let mut headers = self.attribute_columns.clone();
        headers.extend(RESERVED_COLUMNS.iter().map(|c| c.to_string()));
        headers.extend(self.result_headers());

        let rows = self
            .records
            .iter()
            .map(|r| {
                let mut row: Vec<String> = r.attributes.iter().map(attribute_to_cell).collect();
                row.push(r.id.to_string());
                row.push(r.id.to_string());
                row.push(Counterpart::to_cell(&r.counterpart));
                row.extend(Self::result_cells(r));
                row
            })
            .collect();

        Sheet { headers, rows }
    }

    /// Final layout: cv_1_id, cv_2_id, attributes, then results. The internal id is dropped.
    pub fn to_final_sheet(&self) -> Sheet {
        let mut headers = vec![
            PRIMARY_ID_COLUMN.to_string(),
            COUNTERPART_ID_COLUMN.to_string(),
        ];
        headers.extend(self.attribute_columns.iter().cloned());
        headers.extend(self.result_headers());

        let rows = self
            .records
            .iter()
            .map(|r| {
                let mut row = vec![r.id.to_string(), Counterpart::to_cell(&r.counterpart)];
                row.extend(r.attributes.iter().map(attribute_to_cell));
                row.extend(Self::result_cells(r));
                row
            })
            .collect();

        Sheet { headers, rows }
    }

    fn result_headers(&self) -> impl Iterator<Item = String> + '_ {
        self.judges
            .iter()
            .flat_map(|j| [format!("{SCORE_PREFIX}{j}"), format!("{WINNER_PREFIX}{j}")])
    }

    fn result_cells(record: &Record) -> impl Iterator<Item = String> + '_ {
        record
            .results
            .iter()
            .flat_map(|r| [r.score.to_string(), Winner::to_cell(&r.winner)])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn judges(&self) -> &[String] {
        &self.judges
    }

    pub fn judge_index(&self, judge: &str) -> Option<usize> {
        self.judges.iter().position(|j| j == judge)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, position: usize) -> &Record {
        &self.records[position]
    }

    /// Cover-letter text of the record at `position`; a "NONE" body reads as empty.
    pub fn body(&self, position: usize) -> &str {
        self.records[position].attributes[self.body_index]
            .as_deref()
            .unwrap_or_default()
    }

    pub fn result(&self, position: usize, judge: usize) -> &JudgeResult {
        &self.records[position].results[judge]
    }

    /// Lowest position whose counterpart cell is empty, else `start_offset`.
    pub fn resume_position(&self, start_offset: usize) -> usize {
        self.records
            .iter()
            .position(|r| r.counterpart.is_none())
            .unwrap_or(start_offset)
    }

    fn check_position(&self, position: usize) -> Result<(), AppError> {
        if position >= self.records.len() {
            return Err(AppError::Config(format!(
                "row {position} is outside a table of {} rows",
                self.records.len()
            )));
        }
        Ok(())
    }

    fn result_mut(&mut self, position: usize, judge: &str) -> Result<&mut JudgeResult, AppError> {
        self.check_position(position)?;
        let j = self
            .judge_index(judge)
            .ok_or_else(|| AppError::Config(format!("no result columns for judge '{judge}'")))?;
        Ok(&mut self.records[position].results[j])
    }

    /// In-place cell updates. Only the column's existence is checked.
    pub fn set_score(&mut self, position: usize, judge: &str, score: u32) -> Result<(), AppError> {
        self.result_mut(position, judge)?.score = score;
        Ok(())
    }

    pub fn set_winner(&mut self, position: usize, judge: &str, winner: Winner) -> Result<(), AppError> {
        self.result_mut(position, judge)?.winner = Some(winner);
        Ok(())
    }

    pub fn set_counterpart(&mut self, position: usize, counterpart: Counterpart) -> Result<(), AppError> {
        self.check_position(position)?;
        self.records[position].counterpart = Some(counterpart);
        Ok(())
    }
}

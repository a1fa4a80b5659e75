//! Parsing of the headerless two-column CSV files used to seed ingredients
//! and tags.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::models::{NewIngredient, NewTag};

#[derive(Error, Debug)]
pub enum ReferenceDataError {
    #[error("Line {line}: CSV parse error: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("Line {line}: expected a value in column {column}")]
    MissingColumn { line: u64, column: usize },
}

fn two_columns<R: Read>(reader: R) -> Result<Vec<(String, String)>, ReferenceDataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    loop {
        let line = reader.position().line();
        match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {}
            Err(source) => return Err(ReferenceDataError::Csv { line, source }),
        }
        let line = record.position().map_or(line, |p| p.line());

        // A lone empty field is a blank line.
        if record.iter().all(str::is_empty) {
            continue;
        }

        let column = |index: usize| match record.get(index) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(ReferenceDataError::MissingColumn {
                line,
                column: index + 1,
            }),
        };
        rows.push((column(0)?, column(1)?));
    }

    Ok(rows)
}

/// `name, measurement_unit` rows.
pub fn parse_ingredients<R: Read>(reader: R) -> Result<Vec<NewIngredient>, ReferenceDataError> {
    Ok(two_columns(reader)?
        .into_iter()
        .map(|(name, measurement_unit)| NewIngredient {
            name,
            measurement_unit,
        })
        .collect())
}

/// `name, slug` rows.
pub fn parse_tags<R: Read>(reader: R) -> Result<Vec<NewTag>, ReferenceDataError> {
    Ok(two_columns(reader)?
        .into_iter()
        .map(|(name, slug)| NewTag { name, slug })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingredients() {
        let data = "абрикосовое варенье,г\n  flour , g \n\nmilk,ml\n";
        let rows = parse_ingredients(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "абрикосовое варенье");
        assert_eq!(rows[0].measurement_unit, "г");
        assert_eq!(rows[1].name, "flour");
        assert_eq!(rows[1].measurement_unit, "g");
        assert_eq!(rows[2].name, "milk");
    }

    #[test]
    fn test_quoted_field_with_comma() {
        let rows = parse_ingredients("\"salt, sea\",g\n".as_bytes()).unwrap();
        assert_eq!(rows[0].name, "salt, sea");
    }

    #[test]
    fn test_parse_tags() {
        let rows = parse_tags("Breakfast,breakfast\nDinner,dinner".as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![
                NewTag {
                    name: "Breakfast".into(),
                    slug: "breakfast".into()
                },
                NewTag {
                    name: "Dinner".into(),
                    slug: "dinner".into()
                },
            ]
        );
    }

    #[test]
    fn test_missing_column() {
        let err = parse_tags("Breakfast,breakfast\nLunch\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ReferenceDataError::MissingColumn { line: 2, column: 2 }
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_tags("".as_bytes()).unwrap().is_empty());
    }
}

use std::path::Path;

use log::{debug, info};
use sqlx::{Pool, Postgres};

use crate::actions::get_or_create_ingredient;
use crate::error::ApiError;

/// Parses one line of the two-column ingredient dataset,
/// `name,measurement_unit`. Commas may appear inside the name, so the
/// unit is taken from the last column. Blank lines yield `None`.
pub fn parse_ingredient_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (name, unit) = line.rsplit_once(',')?;
    let name = name.trim();
    let unit = unit.trim();
    if name.is_empty() || unit.is_empty() {
        return None;
    }

    Some((name.to_string(), unit.to_string()))
}

/// Bulk-loads ingredient reference data from a CSV file. Idempotent:
/// rows already present are skipped. Returns how many rows were
/// created.
pub async fn load_ingredients(path: &Path, pool: &Pool<Postgres>) -> Result<u64, ApiError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| ApiError::Database(format!("failed to read {}: {e}", path.display())))?;

    let mut created = 0;
    for line in data.lines() {
        let Some((name, unit)) = parse_ingredient_line(line) else {
            continue;
        };

        let (_, was_created) = get_or_create_ingredient(&name, &unit, pool).await?;
        if was_created {
            debug!("created ingredient '{name}' ({unit})");
            created += 1;
        } else {
            debug!("ingredient '{name}' ({unit}) already exists");
        }
    }

    info!("ingredient load finished, {created} rows created");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_line() {
        assert_eq!(
            parse_ingredient_line("flour,g"),
            Some(("flour".to_string(), "g".to_string()))
        );
    }

    #[test]
    fn unit_is_the_last_column() {
        assert_eq!(
            parse_ingredient_line("salt, coarse,g"),
            Some(("salt, coarse".to_string(), "g".to_string()))
        );
    }

    #[test]
    fn blank_and_malformed_lines_are_skipped() {
        assert_eq!(parse_ingredient_line(""), None);
        assert_eq!(parse_ingredient_line("   "), None);
        assert_eq!(parse_ingredient_line("no-comma"), None);
        assert_eq!(parse_ingredient_line("flour,"), None);
    }
}

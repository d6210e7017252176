//! List command implementation.

use crate::cli::ListArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use overlay_domain::{Collection, RecordStore};
use overlay_store::SqliteRecordStore;

/// Resolve the collections a list request covers.
pub fn selected_collections(filter: Option<&str>) -> Result<Vec<Collection>> {
    match filter {
        None => Ok(Collection::ALL.to_vec()),
        Some(name) => Collection::parse(name).map(|c| vec![c]).ok_or_else(|| {
            CliError::InvalidInput(format!(
                "Unknown collection '{}' (expected ship or slap)",
                name
            ))
        }),
    }
}

/// Execute the list command.
pub async fn execute_list(args: ListArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let collections = selected_collections(args.collection.as_deref())?;
    let store = SqliteRecordStore::new(&config.store.path)?;

    let mut rows = Vec::new();
    for collection in collections {
        let records = store.fetch_all(collection).await?;
        rows.extend(records.into_iter().map(|record| (collection, record)));
    }

    println!("{}", formatter.format_records(&rows)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_collections() {
        assert_eq!(selected_collections(None).unwrap(), Collection::ALL.to_vec());
        assert_eq!(selected_collections(Some("slap")).unwrap(), vec![Collection::Slap]);
        assert_eq!(
            selected_collections(Some("shipRecords")).unwrap(),
            vec![Collection::Ship]
        );
        assert!(matches!(
            selected_collections(Some("users")),
            Err(CliError::InvalidInput(_))
        ));
    }
}

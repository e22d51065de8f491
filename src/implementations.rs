use std::io::Write;

use anyhow::Context;
use fxhash::FxHashMap;
use smol_str::SmolStr;
use thiserror::Error;

use crate::hub::{AttributeRevision, HubClient, ImplementationRevision, ImplementationRevisionFields};
use crate::printer::{print_errors, PrintFormat, ResourcePrinter, TableData};

/// Fields rendered by the table output.
pub const TABLE_REQUIRED_FIELDS: ImplementationRevisionFields =
    ImplementationRevisionFields::ROOT.union(ImplementationRevisionFields::METADATA);

pub fn fields_for_format(format: PrintFormat) -> ImplementationRevisionFields {
    match format {
        PrintFormat::Table => TABLE_REQUIRED_FIELDS,
        PrintFormat::Json | PrintFormat::Yaml => ImplementationRevisionFields::all(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("NotFound: Implementation \"{path}\" not found")]
pub struct NotFoundError {
    pub path: SmolStr,
}

/// Revisions grouped by their path, in fetch order within each path.
pub struct RevisionIndex<'a> {
    by_path: FxHashMap<&'a str, Vec<&'a ImplementationRevision>>,
}

impl<'a> RevisionIndex<'a> {
    pub fn build(revisions: &'a [ImplementationRevision]) -> Self {
        let mut by_path: FxHashMap<&'a str, Vec<&'a ImplementationRevision>> =
            FxHashMap::default();
        for rev in revisions {
            by_path.entry(rev.path()).or_default().push(rev);
        }
        RevisionIndex { by_path }
    }

    pub fn get(&self, path: &str) -> Option<&[&'a ImplementationRevision]> {
        self.by_path.get(path).map(Vec::as_slice)
    }
}

#[derive(Debug, Default)]
pub struct Selection {
    pub revisions: Vec<ImplementationRevision>,
    pub errors: Vec<NotFoundError>,
}

/// Keeps the revisions of the requested paths, in request order.
///
/// With no paths every fetched revision is kept as is. Each unknown path yields one
/// [`NotFoundError`] and the remaining paths are still resolved, so duplicated paths
/// produce duplicated revisions and duplicated errors.
pub fn select<P: AsRef<str>>(fetched: Vec<ImplementationRevision>, paths: &[P]) -> Selection {
    if paths.is_empty() {
        return Selection {
            revisions: fetched,
            errors: Vec::new(),
        };
    }

    let index = RevisionIndex::build(&fetched);
    let mut selection = Selection::default();
    for path in paths {
        let path = path.as_ref();
        match index.get(path) {
            Some(found) => selection
                .revisions
                .extend(found.iter().map(|&rev| rev.clone())),
            None => selection.errors.push(NotFoundError { path: path.into() }),
        }
    }

    selection
}

pub fn table_data_on_get(revisions: &[ImplementationRevision]) -> TableData {
    TableData {
        headers: vec!["PATH".into(), "REVISION".into(), "ATTRIBUTES".into()],
        rows: revisions
            .iter()
            .map(|rev| {
                vec![
                    rev.path().to_string(),
                    rev.revision.to_string(),
                    attribute_names(&rev.metadata.attributes),
                ]
            })
            .collect(),
    }
}

fn attribute_names(attrs: &[Option<AttributeRevision>]) -> String {
    attrs
        .iter()
        .filter_map(|a| a.as_ref()?.path())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn new_printer() -> ResourcePrinter<ImplementationRevision> {
    ResourcePrinter::new()
        .with_json()
        .with_yaml()
        .with_table(table_data_on_get)
}

/// Fetches the ImplementationRevisions, keeps the ones matching `paths` and prints them to `out`.
///
/// Unknown paths are reported to `diag` and do not fail the call.
pub async fn get_implementations<C, P, O, D>(
    client: &C,
    paths: &[P],
    printer: &ResourcePrinter<ImplementationRevision>,
    out: &mut O,
    diag: &mut D,
) -> anyhow::Result<()>
where
    C: HubClient,
    P: AsRef<str> + Sync,
    O: Write + Send,
    D: Write + Send,
{
    let fields = fields_for_format(printer.print_format());
    let fetched = crate::cancellation()
        .run(client.list_implementation_revisions(fields))
        .await
        .ok_or_else(|| anyhow::anyhow!("Cancelled"))?
        .context("Failed to list Implementation revisions")?;
    log::debug!("Fetched {} Implementation revisions", fetched.len());

    let Selection { revisions, errors } = select(fetched, paths);
    log::debug!(
        "Selected {} revisions, {} paths not found",
        revisions.len(),
        errors.len()
    );

    print_errors(diag, &errors).context("Failed to report errors")?;
    printer.print(out, &revisions)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::AttributeMetadata;
    use std::sync::Mutex;

    fn attr(path: &str) -> Option<AttributeRevision> {
        Some(AttributeRevision {
            metadata: Some(AttributeMetadata {
                path: Some(path.into()),
            }),
            revision: Some("0.1.0".into()),
        })
    }

    fn rev(path: &str, revision: &str) -> ImplementationRevision {
        serde_json::from_value(serde_json::json!({
            "revision": revision,
            "metadata": { "path": path },
        }))
        .unwrap()
    }

    fn fetched() -> Vec<ImplementationRevision> {
        vec![
            rev("cap.x", "0.1.0"),
            rev("cap.y", "1.0.0"),
            rev("cap.x", "0.2.0"),
        ]
    }

    fn labels(revisions: &[ImplementationRevision]) -> Vec<(&str, &str)> {
        revisions
            .iter()
            .map(|r| (r.path(), r.revision.as_str()))
            .collect()
    }

    struct FakeHub {
        revisions: Vec<ImplementationRevision>,
        requested: Mutex<Vec<ImplementationRevisionFields>>,
    }

    impl FakeHub {
        fn new(revisions: Vec<ImplementationRevision>) -> Self {
            FakeHub {
                revisions,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    impl HubClient for FakeHub {
        async fn list_implementation_revisions(
            &self,
            fields: ImplementationRevisionFields,
        ) -> anyhow::Result<Vec<ImplementationRevision>> {
            self.requested.lock().unwrap().push(fields);
            Ok(self.revisions.clone())
        }
    }

    struct FailingHub;

    impl HubClient for FailingHub {
        async fn list_implementation_revisions(
            &self,
            _fields: ImplementationRevisionFields,
        ) -> anyhow::Result<Vec<ImplementationRevision>> {
            anyhow::bail!("connection refused")
        }
    }

    #[test]
    fn test_fields_for_format() {
        assert_eq!(
            fields_for_format(PrintFormat::Table),
            ImplementationRevisionFields::ROOT | ImplementationRevisionFields::METADATA
        );
        assert_eq!(
            fields_for_format(PrintFormat::Json),
            ImplementationRevisionFields::all()
        );
        assert_eq!(
            fields_for_format(PrintFormat::Yaml),
            ImplementationRevisionFields::all()
        );
    }

    #[test]
    fn test_index_groups_by_path() {
        let mut revisions = fetched();
        revisions.push(rev("cap.x", "0.1.0"));
        let index = RevisionIndex::build(&revisions);

        let x: Vec<&str> = index
            .get("cap.x")
            .unwrap()
            .iter()
            .map(|r| r.revision.as_str())
            .collect();
        assert_eq!(x, vec!["0.1.0", "0.2.0", "0.1.0"]);
        assert_eq!(index.get("cap.y").map(<[_]>::len), Some(1));
        assert!(index.get("cap.z").is_none());
        assert!(RevisionIndex::build(&[]).get("cap.x").is_none());
    }

    #[test]
    fn test_select_without_paths_keeps_everything() {
        let selection = select::<&str>(fetched(), &[]);
        assert_eq!(selection.revisions, fetched());
        assert!(selection.errors.is_empty());
    }

    #[test]
    fn test_select_follows_request_order() {
        let selection = select(fetched(), &["cap.y", "cap.x"]);
        assert_eq!(
            labels(&selection.revisions),
            vec![("cap.y", "1.0.0"), ("cap.x", "0.1.0"), ("cap.x", "0.2.0")]
        );
        assert!(selection.errors.is_empty());
    }

    #[test]
    fn test_select_reports_missing_paths() {
        let selection = select(
            fetched(),
            &["missing.path", "cap.y", "missing.path", "other"],
        );
        assert_eq!(labels(&selection.revisions), vec![("cap.y", "1.0.0")]);
        assert_eq!(
            selection.errors,
            vec![
                NotFoundError {
                    path: "missing.path".into()
                },
                NotFoundError {
                    path: "missing.path".into()
                },
                NotFoundError {
                    path: "other".into()
                },
            ]
        );
        assert_eq!(
            selection.errors[0].to_string(),
            "NotFound: Implementation \"missing.path\" not found"
        );
    }

    #[test]
    fn test_select_duplicate_paths() {
        let selection = select(fetched(), &["cap.y", "cap.y"]);
        assert_eq!(
            labels(&selection.revisions),
            vec![("cap.y", "1.0.0"), ("cap.y", "1.0.0")]
        );
    }

    #[test]
    fn test_table_data() {
        let mut with_attrs = rev("cap.x", "0.1.0");
        with_attrs.metadata.attributes = vec![
            attr("a"),
            None,
            attr(""),
            Some(AttributeRevision {
                metadata: None,
                revision: None,
            }),
            attr("b"),
        ];

        let table = table_data_on_get(&[with_attrs, rev("cap.y", "1.0.0")]);
        assert_eq!(table.headers, vec!["PATH", "REVISION", "ATTRIBUTES"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["cap.x".to_string(), "0.1.0".to_string(), "a\nb".to_string()],
                vec!["cap.y".to_string(), "1.0.0".to_string(), String::new()],
            ]
        );
    }

    #[tokio::test]
    async fn test_get_table_requests_table_fields() {
        let hub = FakeHub::new(fetched());
        let printer = new_printer();
        let (mut out, mut diag) = (Vec::new(), Vec::new());

        get_implementations(&hub, &["cap.x"], &printer, &mut out, &mut diag)
            .await
            .unwrap();

        assert_eq!(*hub.requested.lock().unwrap(), vec![TABLE_REQUIRED_FIELDS]);
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("PATH"));
        assert!(out.contains("0.1.0"));
        assert!(out.contains("0.2.0"));
        assert!(!out.contains("cap.y"));
        assert!(diag.is_empty());
    }

    #[tokio::test]
    async fn test_get_reports_not_found_and_still_prints() {
        let hub = FakeHub::new(fetched());
        let mut printer = new_printer();
        printer.set_format(PrintFormat::Json).unwrap();
        let (mut out, mut diag) = (Vec::new(), Vec::new());

        get_implementations(&hub, &["missing.path"], &printer, &mut out, &mut diag)
            .await
            .unwrap();

        assert_eq!(
            *hub.requested.lock().unwrap(),
            vec![ImplementationRevisionFields::all()]
        );
        assert_eq!(
            String::from_utf8(diag).unwrap(),
            "Error: NotFound: Implementation \"missing.path\" not found\n"
        );
        let printed: Vec<ImplementationRevision> = serde_json::from_slice(&out).unwrap();
        assert!(printed.is_empty());
    }

    #[tokio::test]
    async fn test_get_json_round_trip() {
        let mut revisions = fetched();
        revisions[0].metadata.attributes = vec![attr("a"), None];
        revisions[1].spec = Some(serde_json::json!({"action": {"runnerInterface": "argo.run"}}));
        let hub = FakeHub::new(revisions.clone());
        let mut printer = new_printer();
        printer.set_format(PrintFormat::Json).unwrap();
        let (mut out, mut diag) = (Vec::new(), Vec::new());

        get_implementations::<_, &str, _, _>(&hub, &[], &printer, &mut out, &mut diag)
            .await
            .unwrap();

        let printed: Vec<ImplementationRevision> = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed, revisions);
    }

    #[tokio::test]
    async fn test_get_yaml_output() {
        let hub = FakeHub::new(vec![rev("cap.x", "0.1.0")]);
        let mut printer = new_printer();
        printer.set_format(PrintFormat::Yaml).unwrap();
        let (mut out, mut diag) = (Vec::new(), Vec::new());

        get_implementations(&hub, &["cap.x"], &printer, &mut out, &mut diag)
            .await
            .unwrap();

        let printed: Vec<ImplementationRevision> = serde_yaml_ng::from_slice(&out).unwrap();
        assert_eq!(printed, vec![rev("cap.x", "0.1.0")]);
    }

    #[tokio::test]
    async fn test_get_fetch_failure() {
        let printer = new_printer();
        let (mut out, mut diag) = (Vec::new(), Vec::new());

        let err = get_implementations(&FailingHub, &["cap.x"], &printer, &mut out, &mut diag)
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("connection refused"));
        assert!(out.is_empty());
        assert!(diag.is_empty());
    }
}

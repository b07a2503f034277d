// ============================================================
// Layer 4 — Graph Loader
// ============================================================
// Loads a citation graph in the raw Planetoid format used by
// Cora and CiteSeer:
//
//   <name>.content   one line per node:
//                    <node_id> <feat_1> ... <feat_F> <class_label>
//
//   <name>.cites     one line per citation:
//                    <cited_id> <citing_id>
//
// Fields are separated by tabs or spaces. A citation becomes the
// edge citing → cited; with `undirected` (the default) the
// reverse edge is added as well, since GCN treats citations as
// symmetric relations.
//
// CiteSeer lists citations of papers that are missing from the
// .content file. Those lines are skipped and counted rather than
// treated as errors.
//
// Reference: Sen et al. (2008) Collective Classification in
//            Network Data

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::domain::graph::{EdgeList, Graph};
use crate::domain::traits::GraphSource;

/// Loads `<dir>/<name>.content` and `<dir>/<name>.cites`.
pub struct PlanetoidLoader {
    dir:        PathBuf,
    name:       String,
    undirected: bool,
}

impl PlanetoidLoader {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self { dir: dir.into(), name: name.into(), undirected: true }
    }

    /// Keep citations directed (citing → cited only).
    pub fn directed(mut self) -> Self {
        self.undirected = false;
        self
    }

    fn content_path(&self) -> PathBuf {
        self.dir.join(format!("{}.content", self.name))
    }

    fn cites_path(&self) -> PathBuf {
        self.dir.join(format!("{}.cites", self.name))
    }
}

impl GraphSource for PlanetoidLoader {
    fn load(&self) -> Result<Graph> {
        let content_path = self.content_path();
        let cites_path   = self.cites_path();

        let content = fs::read_to_string(&content_path)
            .with_context(|| format!("Cannot read '{}'", content_path.display()))?;
        let (node_ids, features, raw_labels) = parse_content(&content, &content_path)?;

        // Class indices follow the sorted label names so the same
        // dataset always yields the same index → class mapping.
        let class_names: Vec<String> = raw_labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let class_index: HashMap<&str, usize> = class_names
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let labels = raw_labels.iter().map(|l| class_index[l.as_str()]).collect();

        let cites = fs::read_to_string(&cites_path)
            .with_context(|| format!("Cannot read '{}'", cites_path.display()))?;
        let node_index: HashMap<&str, usize> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let (edges, skipped) = parse_cites(&cites, &cites_path, &node_index)?;

        if skipped > 0 {
            tracing::warn!(
                "Skipped {} citations that reference unknown papers in '{}'",
                skipped,
                cites_path.display()
            );
        }

        let edges = if self.undirected { edges.to_undirected() } else { edges };

        let graph = Graph { node_ids, features, labels, class_names, edges };
        graph.validate()?;

        tracing::info!(
            "Loaded '{}': {} nodes, {} features, {} classes, {} edges",
            self.name,
            graph.num_nodes(),
            graph.num_features(),
            graph.num_classes(),
            graph.edges.len()
        );
        Ok(graph)
    }
}

type ContentRows = (Vec<String>, Vec<Vec<f32>>, Vec<String>);

/// Parse the `.content` file into ids, feature rows and raw label names.
fn parse_content(text: &str, path: &Path) -> Result<ContentRows> {
    let mut ids      = Vec::new();
    let mut features = Vec::new();
    let mut labels   = Vec::new();
    let mut width: Option<usize> = None;
    let mut seen: HashSet<&str>  = HashSet::new();

    for (lineno, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 3 {
            bail!(
                "{}:{}: expected '<id> <features...> <label>', found {} fields",
                path.display(),
                lineno + 1,
                fields.len()
            );
        }

        let row: Vec<f32> = fields[1..fields.len() - 1]
            .iter()
            .map(|f| f.parse::<f32>())
            .collect::<Result<_, _>>()
            .with_context(|| format!("{}:{}: non-numeric feature", path.display(), lineno + 1))?;

        match width {
            None => width = Some(row.len()),
            Some(w) if w != row.len() => bail!(
                "{}:{}: {} features, previous rows have {}",
                path.display(),
                lineno + 1,
                row.len(),
                w
            ),
            Some(_) => {}
        }

        if !seen.insert(fields[0]) {
            bail!("{}:{}: duplicate paper id '{}'", path.display(), lineno + 1, fields[0]);
        }
        ids.push(fields[0].to_string());
        features.push(row);
        labels.push(fields[fields.len() - 1].to_string());
    }

    if ids.is_empty() {
        bail!("'{}' contains no nodes", path.display());
    }
    Ok((ids, features, labels))
}

/// Parse the `.cites` file. Returns the edges and the number of skipped lines.
fn parse_cites(
    text:       &str,
    path:       &Path,
    node_index: &HashMap<&str, usize>,
) -> Result<(EdgeList, usize)> {
    let mut edges   = EdgeList::new();
    let mut skipped = 0usize;

    for (lineno, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => continue,
            [cited, citing] => match (node_index.get(citing), node_index.get(cited)) {
                (Some(&src), Some(&dst)) => edges.push(src, dst, None),
                _ => {
                    tracing::debug!("{}:{}: unknown paper, skipping", path.display(), lineno + 1);
                    skipped += 1;
                }
            },
            _ => bail!(
                "{}:{}: expected '<cited> <citing>', found {} fields",
                path.display(),
                lineno + 1,
                fields.len()
            ),
        }
    }
    Ok((edges, skipped))
}

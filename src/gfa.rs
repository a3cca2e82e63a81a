//! GFA 1.0 serialization.
//!
//! Writes the graph in the Graphical Fragment Assembly text format: a
//! header, one `S` line per unitig, and one `L` line per endpoint
//! connection with a k-1 overlap. Segment names are the stable arena ids;
//! an edge and its reverse-complement mirror are written once.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::KontigError;
use crate::graph::CompactedDBG;

/// Writes the graph to `path` in GFA 1.0.
pub fn write_gfa<U: Default + Clone + Send + Sync>(
    cdbg: &CompactedDBG<U>,
    path: &Path,
) -> Result<(), KontigError> {
    let file = File::create(path).map_err(|e| KontigError::GfaWrite {
        source: e,
        path: path.to_path_buf(),
    })?;
    let mut writer = BufWriter::new(file);
    write_gfa_to(cdbg, &mut writer).map_err(|e| KontigError::GfaWrite {
        source: e,
        path: path.to_path_buf(),
    })?;
    info!(path = %path.display(), "wrote graph");
    Ok(())
}

/// Writes the graph to any writer in GFA 1.0.
pub fn write_gfa_to<U: Default + Clone + Send + Sync, W: Write>(
    cdbg: &CompactedDBG<U>,
    w: &mut W,
) -> std::io::Result<()> {
    writeln!(w, "H\tVN:Z:1.0")?;

    let mut segments = cdbg.unitigs();
    segments.sort_by_key(|(id, _)| *id);
    for (id, seq) in &segments {
        writeln!(w, "S\t{id}\t{seq}\tLN:i:{}", seq.len())?;
    }

    let overlap = cdbg.k() - 1;
    for link in cdbg.links() {
        writeln!(
            w,
            "L\t{}\t{}\t{}\t{}\t{overlap}M",
            link.from,
            link.from_strand.gfa_char(),
            link.to,
            link.to_strand.gfa_char(),
        )?;
    }
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gfa_string<U: Default + Clone + Send + Sync>(cdbg: &CompactedDBG<U>) -> String {
        let mut buf = Vec::new();
        write_gfa_to(cdbg, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_and_segment_lines() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"AATGGC");
        let gfa = gfa_string(&cdbg);
        let mut lines = gfa.lines();
        assert_eq!(lines.next(), Some("H\tVN:Z:1.0"));
        let s_line = lines.next().unwrap();
        assert!(s_line.starts_with("S\t"));
        assert!(s_line.ends_with("\tLN:i:6"));
        assert!(s_line.contains("\tAATGGC\t"));
    }

    #[test]
    fn links_written_once_with_overlap() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"AAAAC");
        cdbg.add_sequence(b"AAAAG");
        let gfa = gfa_string(&cdbg);
        let l_lines: Vec<&str> = gfa.lines().filter(|l| l.starts_with("L\t")).collect();
        assert_eq!(l_lines.len(), 2, "gfa:\n{gfa}");
        for line in &l_lines {
            assert!(line.ends_with("\t3M"), "line: {line}");
        }
        // No duplicate connection lines.
        let mut deduped = l_lines.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), l_lines.len());
    }

    #[test]
    fn isolated_unitig_has_no_links() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"AAAAAAA");
        let gfa = gfa_string(&cdbg);
        assert!(!gfa.lines().any(|l| l.starts_with("L\t")), "gfa:\n{gfa}");
    }
}

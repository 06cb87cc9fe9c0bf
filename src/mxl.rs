//! Compressed MusicXML (`.mxl`) support.
//!
//! The archive is a ZIP whose `META-INF/container.xml` names the root score
//! file. Archives without a container fall back to the first `.xml` or
//! `.musicxml` entry outside `META-INF/`.

use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::model::Score;
use crate::parser;

/// Read and parse a .mxl file from raw bytes.
pub fn parse_mxl(data: &[u8]) -> Result<Score> {
    let xml = extract_musicxml_from_mxl(data)?;
    parser::parse_musicxml(&xml)
}

/// Extract the MusicXML content string from .mxl bytes.
pub fn extract_musicxml_from_mxl(data: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| Error::Archive(format!("failed to open archive: {e}")))?;

    let root_file_path = find_root_file(&mut archive)?;
    log::debug!("reading MusicXML root file '{root_file_path}' from archive");

    let mut root_file = archive
        .by_name(&root_file_path)
        .map_err(|e| Error::Archive(format!("root file '{root_file_path}' not found: {e}")))?;

    let mut xml = String::new();
    root_file
        .read_to_string(&mut xml)
        .map_err(|e| Error::Archive(format!("failed to read '{root_file_path}': {e}")))?;

    Ok(xml)
}

/// Find the root MusicXML file: from META-INF/container.xml when present,
/// otherwise the first .xml/.musicxml entry outside META-INF.
fn find_root_file(archive: &mut ZipArchive<Cursor<&[u8]>>) -> Result<String> {
    let container_xml = match archive.by_name("META-INF/container.xml") {
        Ok(mut container_file) => {
            let mut xml = String::new();
            container_file
                .read_to_string(&mut xml)
                .map_err(|e| Error::Archive(format!("failed to read container.xml: {e}")))?;
            Some(xml)
        }
        Err(_) => None,
    };

    if let Some(xml) = container_xml {
        let doc = roxmltree::Document::parse(&xml)
            .map_err(|e| Error::Archive(format!("failed to parse container.xml: {e}")))?;
        return doc
            .descendants()
            .filter(|n| n.tag_name().name() == "rootfile")
            .find_map(|n| n.attribute("full-path"))
            .map(String::from)
            .ok_or_else(|| Error::Archive("no rootfile found in container.xml".to_string()));
    }

    let names: Vec<String> = (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
        .collect();

    names
        .iter()
        .find(|name| {
            !name.starts_with("META-INF/") && (name.ends_with(".xml") || name.ends_with(".musicxml"))
        })
        .cloned()
        .ok_or_else(|| Error::Archive(format!("no MusicXML file found in archive; files: {names:?}")))
}

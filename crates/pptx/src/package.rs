//! In-memory OPC package: the ZIP parts of a presentation.

use crate::xml::{XmlDocument, XmlElement};
use pptgen_core::{Error, Result};
use quick_xml::events::BytesDecl;
use std::fs;
use std::io::{Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const SLIDE_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Template main-part content types and their presentation equivalents.
const TEMPLATE_CONTENT_TYPES: &[(&str, &str)] = &[
    (
        "application/vnd.openxmlformats-officedocument.presentationml.template.main+xml",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
    ),
    (
        "application/vnd.ms-powerpoint.template.macroEnabled.main+xml",
        "application/vnd.ms-powerpoint.presentation.macroEnabled.main+xml",
    ),
];

/// `<?xml version="1.0" encoding="UTF-8" standalone="yes"?>`
pub fn standalone_decl() -> BytesDecl<'static> {
    BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))
}

/// All parts of a ZIP package, in archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

/// Largest buffer reserved up front for one part. The declared size comes
/// from the archive and is not trusted beyond this.
const MAX_PREALLOC: u64 = 1 << 20;

fn initial_capacity(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

impl Package {
    /// Read every file entry of a ZIP archive into memory.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for idx in 0..archive.len() {
            let mut file = archive
                .by_index(idx)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", idx, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(initial_capacity(file.size()));
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            parts.push((name, data));
        }

        log::debug!("Loaded package with {} part(s)", parts.len());
        Ok(Self { parts })
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Whether a part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Part names in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    /// Read a part as UTF-8 text.
    pub fn part_str(&self, name: &str) -> Result<&str> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::ZipError(format!("File not found in archive '{}'", name)))?;
        std::str::from_utf8(data).map_err(|e| Error::XmlError(format!("'{}' is not UTF-8: {}", name, e)))
    }

    /// Parse a part as XML.
    pub fn xml_part(&self, name: &str) -> Result<XmlDocument> {
        XmlDocument::parse(self.part_str(name)?)
    }

    /// Replace a part's bytes, appending it if it is new.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    /// Make a presentation template openable as a presentation.
    ///
    /// Rewrites the main-part content type in `[Content_Types].xml`; every
    /// other part is left byte-for-byte unchanged. Returns whether anything
    /// was rewritten.
    pub fn coerce_template(&mut self) -> Result<bool> {
        let content = self.part_str(CONTENT_TYPES_PART)?;
        let mut rewritten = content.to_string();
        for (template, presentation) in TEMPLATE_CONTENT_TYPES {
            rewritten = rewritten.replace(template, presentation);
        }
        if rewritten == content {
            return Ok(false);
        }
        self.set_part(CONTENT_TYPES_PART, rewritten.into_bytes());
        Ok(true)
    }

    /// Write all parts as a ZIP archive.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(data)?;
        }
        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;
        Ok(())
    }

    /// Write the archive to `path` atomically.
    ///
    /// The archive is written to a temporary file beside the destination and
    /// renamed into place, so a failure never leaves a partial file behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        self.write(temp.as_file_mut())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::IoError(e.error))?;
        Ok(())
    }
}

/// `[Content_Types].xml` with helpers to register new parts.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    doc: XmlDocument,
}

impl ContentTypes {
    /// Parse the content types part of a package.
    pub fn from_package(package: &Package) -> Result<Self> {
        Ok(Self {
            doc: package.xml_part(CONTENT_TYPES_PART)?,
        })
    }

    /// Content type declared for a part (override first, then extension default).
    pub fn content_type(&self, part: &str) -> Option<&str> {
        let part_name = format!("/{}", part);
        if let Some(found) = self
            .doc
            .root
            .children_named("Override")
            .find(|e| e.attr("PartName") == Some(part_name.as_str()))
        {
            return found.attr("ContentType");
        }
        let ext = part.rsplit_once('.').map(|(_, ext)| ext)?;
        self.doc
            .root
            .children_named("Default")
            .find(|e| e.attr("Extension").is_some_and(|x| x.eq_ignore_ascii_case(ext)))
            .and_then(|e| e.attr("ContentType"))
    }

    /// Register an override for a part, replacing any existing one.
    pub fn set_override(&mut self, part: &str, content_type: &str) {
        let part_name = format!("/{}", part);
        if let Some(existing) = self
            .doc
            .root
            .elements_mut()
            .find(|e| e.local_name() == "Override" && e.attr("PartName") == Some(part_name.as_str()))
        {
            existing.set_attr("ContentType", content_type);
            return;
        }
        let name = crate::xml::qualified(self.doc.root.prefix(), "Override");
        self.doc.root.children.push(crate::xml::XmlNode::Element(
            XmlElement::new(name)
                .with_attr("PartName", part_name)
                .with_attr("ContentType", content_type),
        ));
    }

    /// Serialize back to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.doc.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TEMPLATE_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="PNG" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.template.main+xml"/></Types>"#;

    fn zip_bytes(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut package = Package::default();
        for (name, data) in parts {
            package.set_part(name, data.to_vec());
        }
        let mut cursor = Cursor::new(Vec::new());
        package.write(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_coerce_template_rewrites_only_content_types() {
        let media: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x00, 0xFF];
        let bytes = zip_bytes(&[
            (CONTENT_TYPES_PART, TEMPLATE_TYPES.as_bytes()),
            ("ppt/media/image1.png", media),
        ]);
        let mut package = Package::from_reader(Cursor::new(bytes)).unwrap();

        assert!(package.coerce_template().unwrap());
        let types = package.part_str(CONTENT_TYPES_PART).unwrap();
        assert!(types.contains("presentationml.presentation.main+xml"));
        assert!(!types.contains("template.main+xml"));
        assert_eq!(package.part("ppt/media/image1.png"), Some(media));
        assert_eq!(
            package.part_names().collect::<Vec<_>>(),
            vec![CONTENT_TYPES_PART, "ppt/media/image1.png"]
        );

        assert!(!package.coerce_template().unwrap());
    }

    #[test]
    fn test_content_types_lookup_and_override() {
        let package = {
            let mut p = Package::default();
            p.set_part(CONTENT_TYPES_PART, TEMPLATE_TYPES.as_bytes().to_vec());
            p
        };
        let mut types = ContentTypes::from_package(&package).unwrap();
        assert_eq!(types.content_type("ppt/media/a.png"), Some("image/png"));
        assert_eq!(types.content_type("ppt/slides/slide2.xml"), Some("application/xml"));

        types.set_override("ppt/slides/slide2.xml", SLIDE_CONTENT_TYPE);
        types.set_override("ppt/slides/slide2.xml", SLIDE_CONTENT_TYPE);
        assert_eq!(types.content_type("ppt/slides/slide2.xml"), Some(SLIDE_CONTENT_TYPE));

        let text = String::from_utf8(types.to_bytes().unwrap()).unwrap();
        assert_eq!(text.matches("/ppt/slides/slide2.xml").count(), 1);
    }

    #[test]
    fn test_save_is_atomic_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out").join("deck.pptx");
        let mut package = Package::default();
        package.set_part("a.xml", b"<a/>".to_vec());

        package.save(&target).unwrap();
        let reloaded = Package::from_reader(fs::File::open(&target).unwrap()).unwrap();
        assert_eq!(reloaded.part("a.xml"), Some(&b"<a/>"[..]));

        let leftovers: Vec<_> = fs::read_dir(target.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_initial_capacity_is_capped() {
        assert_eq!(initial_capacity(0), 0);
        assert_eq!(initial_capacity(4096), 4096);
        assert_eq!(initial_capacity(u64::MAX), 1 << 20);
    }

    #[test]
    fn test_from_reader_rejects_non_zip() {
        let result = Package::from_reader(Cursor::new(b"definitely not a zip".to_vec()));
        assert!(matches!(result, Err(Error::ZipError(_))));
    }
}

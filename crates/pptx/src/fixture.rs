//! Minimal presentations built in memory for tests.

use crate::package::{Package, CONTENT_TYPES_PART};
use std::io::Cursor;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn content_types(template: bool, with_slide: bool) -> String {
    let main = if template {
        "application/vnd.openxmlformats-officedocument.presentationml.template.main+xml"
    } else {
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"
    };
    let slide = if with_slide {
        r#"<Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/notesSlides/notesSlide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/>"#
    } else {
        ""
    };
    format!(
        r#"{DECL}
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="{main}"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/slideLayouts/slideLayout2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>{slide}</Types>"#
    )
}

fn rels(entries: &[(&str, &str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, kind, target)| {
            format!(r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}"/>"#)
        })
        .collect();
    format!(
        r#"{DECL}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{body}</Relationships>"#
    )
}

fn presentation(with_slide: bool) -> String {
    let slides = if with_slide {
        r#"<p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst>"#
    } else {
        ""
    };
    format!(
        r#"{DECL}
<p:presentation {NS} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{slides}<p:sldSz cx="9144000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    )
}

fn placeholder(id: u32, name: &str, ph: &str, text: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
    )
}

fn shape_tree(shapes: &str) -> String {
    format!(
        r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree>"#
    )
}

fn master() -> String {
    format!(
        r#"{DECL}
<p:sldMaster {NS}><p:cSld>{}</p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/><p:sldLayoutId id="2147483650" r:id="rId2"/></p:sldLayoutIdLst></p:sldMaster>"#,
        shape_tree("")
    )
}

fn layout(name: &str, shapes: &str) -> String {
    format!(
        r#"{DECL}
<p:sldLayout {NS} preserve="1"><p:cSld name="{name}">{}</p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        shape_tree(shapes)
    )
}

fn title_and_content() -> String {
    let shapes = [
        placeholder(2, "Title 1", r#"<p:ph type="title"/>"#, "Click to edit Master title style"),
        placeholder(3, "Content Placeholder 2", r#"<p:ph idx="1"/>"#, "{content}"),
        placeholder(4, "Footer Placeholder 3", r#"<p:ph type="ftr" sz="quarter" idx="11"/>"#, "{footer}"),
        r#"<p:sp><p:nvSpPr><p:cNvPr id="5" name="Band"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{decoration}</a:t></a:r></a:p></p:txBody></p:sp>"#.to_string(),
    ];
    layout("Title and Content", &shapes.concat())
}

fn cell(text: Option<&str>) -> String {
    match text {
        Some(text) => format!(
            r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="1200"/><a:t>{text}</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>"#
        ),
        None => "<a:tc><a:tcPr/></a:tc>".to_string(),
    }
}

fn slide() -> String {
    let title = r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" b="1"/><a:t>{Client}</a:t></a:r></a:p></p:txBody></p:sp>"#;
    let text_box = r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="TextBox 2"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="1600200"/><a:ext cx="8229600" cy="914400"/></a:xfrm></p:spPr><p:txBody><a:bodyPr wrap="square"/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="2000"/><a:t>Client: {Cli</a:t></a:r><a:r><a:rPr lang="en-US" sz="2000"/><a:t>ent}, Revenue: {Rev}</a:t></a:r><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#;
    let connector = r#"<p:cxnSp><p:nvCxnSpPr><p:cNvPr id="4" name="Connector 3"/><p:cNvCxnSpPr/><p:nvPr/></p:nvCxnSpPr><p:spPr/></p:cxnSp>"#;
    let group = r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="5" name="Group 4"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="6" name="Note"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>Owner: {Owner}</a:t></a:r></a:p></p:txBody></p:sp></p:grpSp>"#;
    let header = ["Client", "Project Name", "Days to Sign", "Revenue"]
        .into_iter()
        .map(|t| cell(Some(t)))
        .collect::<String>();
    let values = [
        Some("{Client_1}"),
        Some("{Project_Name_1}"),
        Some("{Days_to_Sign_1}"),
        None,
    ]
    .into_iter()
    .map(cell)
    .collect::<String>();
    let table = format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="7" name="Table 6"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="457200" y="2743200"/><a:ext cx="8229600" cy="741680"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr firstRow="1"/><a:tblGrid><a:gridCol w="2057400"/><a:gridCol w="2057400"/><a:gridCol w="2057400"/><a:gridCol w="2057400"/></a:tblGrid><a:tr h="370840">{header}</a:tr><a:tr h="370840">{values}</a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#
    );
    let rectangle = r#"<p:sp><p:nvSpPr><p:cNvPr id="8" name="Rectangle 7"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:sp>"#;

    format!(
        r#"{DECL}
<p:sld {NS}><p:cSld>{}</p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        shape_tree(&[title, text_box, connector, group, table.as_str(), rectangle].concat())
    )
}

fn notes() -> String {
    format!(
        r#"{DECL}
<p:notes {NS}><p:cSld>{}</p:cSld></p:notes>"#,
        shape_tree("")
    )
}

fn build(template: bool, with_slide: bool) -> Vec<u8> {
    let mut package = Package::default();
    let mut add = |name: &str, content: String| package.set_part(name, content.into_bytes());

    add(CONTENT_TYPES_PART, content_types(template, with_slide));
    add(
        "_rels/.rels",
        rels(&[("rId1", "officeDocument", "ppt/presentation.xml")]),
    );
    add("ppt/presentation.xml", presentation(with_slide));
    let mut presentation_rels = vec![("rId1", "slideMaster", "slideMasters/slideMaster1.xml")];
    if with_slide {
        presentation_rels.push(("rId2", "slide", "slides/slide1.xml"));
    }
    add("ppt/_rels/presentation.xml.rels", rels(&presentation_rels));
    add("ppt/slideMasters/slideMaster1.xml", master());
    add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        rels(&[
            ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            ("rId2", "slideLayout", "../slideLayouts/slideLayout2.xml"),
        ]),
    );
    add(
        "ppt/slideLayouts/slideLayout1.xml",
        layout(
            "Title Slide",
            &placeholder(2, "Title 1", r#"<p:ph type="ctrTitle"/>"#, "Click to edit Master title style"),
        ),
    );
    add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
    );
    add("ppt/slideLayouts/slideLayout2.xml", title_and_content());
    add(
        "ppt/slideLayouts/_rels/slideLayout2.xml.rels",
        rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
    );
    if with_slide {
        add("ppt/slides/slide1.xml", slide());
        add(
            "ppt/slides/_rels/slide1.xml.rels",
            rels(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout2.xml"),
                ("rId2", "notesSlide", "../notesSlides/notesSlide1.xml"),
            ]),
        );
        add("ppt/notesSlides/notesSlide1.xml", notes());
    }

    let mut cursor = Cursor::new(Vec::new());
    package.write(&mut cursor).unwrap();
    cursor.into_inner()
}

/// A one-slide deck: title, split-run text box, connector, grouped text,
/// a 2x4 table and an empty rectangle. `template` marks it as a `.potx`.
pub fn deck(template: bool) -> Vec<u8> {
    build(template, true)
}

/// Master and layouts only, no slides.
pub fn empty_deck() -> Vec<u8> {
    build(false, false)
}

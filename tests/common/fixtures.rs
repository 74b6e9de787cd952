use image::{ImageBuffer, ImageFormat, Rgb};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::io::Cursor;
use towerdoc::{RedlineOffset, ReportRecord};
use towerdoc_types::{AntennaRow, Appendix, ChecklistRow, ChecklistStatus, Deficiency, TransmissionLineRow};

/// A record with a little of everything.
pub fn full_record() -> ReportRecord {
    ReportRecord {
        id: "ny-1234".into(),
        site_code: "NY1234".into(),
        site_name: "hilltop relay".into(),
        region: "NE".into(),
        job_number: "J-2024-77".into(),
        customer: Some("Northeast Towers".into()),
        engineer: Some("Sam Rivera".into()),
        inspection_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 14),
        front_images: vec!["site/front.png".into()],
        signature_image: None,
        scope_of_work: vec![
            "Climb and visually inspect the monopole.".into(),
            "Inventory all antennas and feed lines.".into(),
        ],
        antennas: vec![AntennaRow {
            sector: Some("Alpha".into()),
            position: Some("1".into()),
            carrier: Some("Verizon".into()),
            model: Some("NHH-65B".into()),
            height: Some("120 ft".into()),
            azimuth: Some("0".into()),
        }],
        transmission_lines: vec![TransmissionLineRow {
            size: Some("1-5/8\"".into()),
            count: Some("6".into()),
            carrier: Some("Verizon".into()),
            location: None,
        }],
        deficiencies: vec![Deficiency {
            description: "Missing bolt on leg splice".into(),
            location: Some("Leg B, 80 ft".into()),
            severity: Some("High".into()),
            photos: vec!["site/bolt.png".into()],
        }],
        checklist: vec![
            ChecklistRow {
                item: "Grounding intact".into(),
                status: ChecklistStatus::Yes,
                notes: None,
            },
            ChecklistRow {
                item: "Lighting operational".into(),
                status: ChecklistStatus::Unset,
                notes: None,
            },
        ],
        appendices: vec![Appendix {
            title: "Appendix A - Site Drawings".into(),
            notes: vec!["Drawings supplied by the owner.".into()],
            images: vec![],
        }],
        redline: RedlineOffset::default(),
        redline_document: None,
    }
}

/// The bare minimum a store might hold.
pub fn sparse_record(id: &str) -> ReportRecord {
    ReportRecord {
        id: id.into(),
        site_code: "TX0042".into(),
        ..Default::default()
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgb([90u8, 140, 60]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}

/// A PDF with `pages` pages, each reading `Redline N`.
pub fn redline_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Redline {n}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().expect("encode content")));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save redline pdf");
    out
}

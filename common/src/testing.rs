//! Record fixtures shared by unit and integration tests

use crate::types::*;

/// A conforming report: every check passes and the lab says PASS
///
/// Lot of 5000 at level II (letter L, sample 200) for the general check,
/// lot of 5000 at S3 (letter F, sample 20) for the special check.
pub fn sample_record() -> FriExtraction {
    FriExtraction {
        report: ReportInfo {
            laboratory: "Bureau Veritas".into(),
            id_report: "BV-2024-0193".into(),
            date_report: "2024-11-05".into(),
        },
        barcode: Barcode {
            gtin: "3256540123456-A".into(),
            export_carton: "13256540123453".into(),
            format_export_carton: "EAN-128".into(),
            format_packaging: "EAN-13".into(),
        },
        product: Product {
            product_label: "Stainless steel kettle 1.7L".into(),
            product_description: "Electric kettle".into(),
            supplier_label: "Ningbo Home Appliances".into(),
            supplier_ref: "NHA-KT17".into(),
            manufacturer_label: "Ningbo Home Appliances".into(),
        },
        silica_gel: Some(SilicaGel {
            carton: SilicaGelLocation::Inner,
            quantity: 2,
            white_transparent: true,
            name: SilicaGelType::SilicaGel,
        }),
        command_informations: CommandInformations {
            commands: Vec::new(),
            command_total: Some(CommandTotal {
                po: Some("PO-448812".into()),
                lec: Some("LEC-2291".into()),
                total_quantity: Quantity {
                    order_quantity: 5000,
                    order_carton: 500,
                    presented_quantity: 5000,
                    presented_carton: 500,
                },
            }),
        },
        inspection_conclusion: InspectionConclusion::all_pass(),
        overall_inspection_conclusion: InspectionResult::Pass,
        notes: Notes::default(),
        aql: Aql {
            general_check: AqlCheck {
                level: AqlLevel::II,
                sample_size: 200,
                no_opened_carton: Some(15),
                category: AqlCategory {
                    critical: 0.0,
                    major: 2.5,
                    minor: 4.0,
                },
                maximum_allowed: Some(DefectLimits {
                    critical: 0,
                    major: 10,
                    minor: 14,
                }),
                defect_description: vec![Defect {
                    defect_description: "Light scratch on lid".into(),
                    critical: 0,
                    major: 1,
                    minor: 3,
                }],
            },
            special_check: Some(AqlCheck {
                level: AqlLevel::S3,
                sample_size: 20,
                no_opened_carton: None,
                category: AqlCategory {
                    critical: 0.0,
                    major: 2.5,
                    minor: 4.0,
                },
                maximum_allowed: None,
                defect_description: Vec::new(),
            }),
        },
        shipping_marks: ShippingMarks {
            barcode_conformity_inner_carton: "Conform".into(),
            barcode_conformity_master_carton: "Gencode present on 4 faces".into(),
        },
    }
}

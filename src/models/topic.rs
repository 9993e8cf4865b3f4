use crate::models::locale::LocalizedText;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One ISA certification domain. Weights are the official exam proportions
/// and drive the composition of full exams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: i32,
    pub name: LocalizedText,
    pub weight: u32,
    pub description: LocalizedText,
}

static CATALOG: OnceLock<Vec<Topic>> = OnceLock::new();

pub fn catalog() -> &'static [Topic] {
    CATALOG.get_or_init(build_catalog)
}

pub fn get(topic_id: i32) -> Option<&'static Topic> {
    catalog().iter().find(|t| t.id == topic_id)
}

fn topic(
    id: i32,
    name_es: &str,
    name_en: &str,
    weight: u32,
    desc_es: &str,
    desc_en: &str,
) -> Topic {
    Topic {
        id,
        name: LocalizedText::new(name_es, name_en),
        weight,
        description: LocalizedText::new(desc_es, desc_en),
    }
}

fn build_catalog() -> Vec<Topic> {
    vec![
        topic(
            1,
            "Biología del Árbol",
            "Tree Biology",
            11,
            "Estructura, función y procesos vitales de los árboles",
            "Structure, function and life processes of trees",
        ),
        topic(
            2,
            "Identificación y Selección",
            "Identification and Selection",
            9,
            "Identificación de especies y selección para el sitio",
            "Species identification and selection for the site",
        ),
        topic(
            3,
            "Manejo de Suelo",
            "Soil Management",
            7,
            "Propiedades del suelo, fertilización y manejo del agua",
            "Soil properties, fertilization and water management",
        ),
        topic(
            4,
            "Instalación y Establecimiento",
            "Installation and Establishment",
            9,
            "Plantación correcta y cuidados de establecimiento",
            "Proper planting and establishment care",
        ),
        topic(
            5,
            "Poda",
            "Pruning",
            14,
            "Técnicas, objetivos y fisiología de la poda",
            "Pruning techniques, objectives and physiology",
        ),
        topic(
            6,
            "Diagnóstico y Tratamiento",
            "Diagnosis and Treatment",
            9,
            "Diagnóstico de plagas, enfermedades y desórdenes",
            "Diagnosis of pests, diseases and disorders",
        ),
        topic(
            7,
            "Árboles y Construcción",
            "Trees and Construction",
            9,
            "Protección de árboles durante la construcción",
            "Tree protection during construction",
        ),
        topic(
            8,
            "Riesgo de Árboles",
            "Tree Risk",
            11,
            "Evaluación y mitigación del riesgo arbóreo",
            "Tree risk assessment and mitigation",
        ),
        topic(
            9,
            "Prácticas de Trabajo Seguras",
            "Safe Work Practices",
            15,
            "Seguridad en trepa, equipos y operaciones",
            "Climbing, equipment and operational safety",
        ),
        topic(
            10,
            "Silvicultura Urbana",
            "Urban Forestry",
            6,
            "Manejo del arbolado urbano y su valoración",
            "Urban tree management and appraisal",
        ),
    ]
}

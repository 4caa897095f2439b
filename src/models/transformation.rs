use serde::Serialize;

/// Créditos debitados por transformação aplicada
pub const CREDIT_FEE: i64 = 1;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationType {
    #[serde(rename = "type")]
    pub key: &'static str,
    pub title: &'static str,
    pub sub_title: &'static str,
    pub icon: &'static str,
    pub credit_fee: i64,
}

pub static TRANSFORMATION_TYPES: [TransformationType; 5] = [
    TransformationType {
        key: "restore",
        title: "Restore Image",
        sub_title: "Refine images by removing noise and imperfections",
        icon: "image.svg",
        credit_fee: CREDIT_FEE,
    },
    TransformationType {
        key: "removeBackground",
        title: "Background Remove",
        sub_title: "Removes the background of the image using AI",
        icon: "camera.svg",
        credit_fee: CREDIT_FEE,
    },
    TransformationType {
        key: "fill",
        title: "Generative Fill",
        sub_title: "Enhance an image's dimensions using AI outpainting",
        icon: "stars.svg",
        credit_fee: CREDIT_FEE,
    },
    TransformationType {
        key: "remove",
        title: "Object Remove",
        sub_title: "Identify and eliminate objects from images",
        icon: "scan.svg",
        credit_fee: CREDIT_FEE,
    },
    TransformationType {
        key: "recolor",
        title: "Object Recolor",
        sub_title: "Identify and recolor objects from the image",
        icon: "filter.svg",
        credit_fee: CREDIT_FEE,
    },
];

pub fn find_transformation(key: &str) -> Option<&'static TransformationType> {
    TRANSFORMATION_TYPES.iter().find(|t| t.key == key)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInclusion {
    pub label: &'static str,
    pub is_included: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditPlan {
    pub id: i32,
    pub name: &'static str,
    pub icon: &'static str,
    pub price: u32,
    pub credits: i64,
    pub inclusions: &'static [PlanInclusion],
}

const FULL_ACCESS: [PlanInclusion; 5] = [
    PlanInclusion { label: "Full Access to Services", is_included: true },
    PlanInclusion { label: "Priority Customer Support", is_included: true },
    PlanInclusion { label: "Priority Updates", is_included: true },
    PlanInclusion { label: "Unlimited Downloads", is_included: true },
    PlanInclusion { label: "Generative Fill Access", is_included: true },
];

pub static CREDIT_PLANS: [CreditPlan; 3] = [
    CreditPlan {
        id: 1,
        name: "Free",
        icon: "/assets/icons/free-plan.svg",
        price: 0,
        credits: 20,
        inclusions: &[
            PlanInclusion { label: "20 Free Credits", is_included: true },
            PlanInclusion { label: "Basic Access to Services", is_included: true },
            PlanInclusion { label: "Priority Customer Support", is_included: false },
            PlanInclusion { label: "Priority Updates", is_included: false },
        ],
    },
    CreditPlan {
        id: 2,
        name: "Pro Package",
        icon: "/assets/icons/free-plan.svg",
        price: 40,
        credits: 120,
        inclusions: &FULL_ACCESS,
    },
    CreditPlan {
        id: 3,
        name: "Premium Package",
        icon: "/assets/icons/free-plan.svg",
        price: 199,
        credits: 2000,
        inclusions: &FULL_ACCESS,
    },
];

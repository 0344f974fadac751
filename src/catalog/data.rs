//! Static catalog data: modules, packs, sports and the option lists the
//! flows offer.

use super::SportCategory;

/// A subscribable coaching module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInfo {
    pub id: &'static str,
    pub name_fr: &'static str,
    pub name_en: &'static str,
    pub description: &'static str,
    /// Monthly price in euros.
    pub price_eur: u32,
    /// Minutes of onboarding questions the module adds.
    pub setup_minutes: u32,
}

/// A named bundle of modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackInfo {
    pub id: &'static str,
    pub name_fr: &'static str,
    pub name_en: &'static str,
    pub description: &'static str,
    pub modules: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SportInfo {
    pub id: &'static str,
    pub name_fr: &'static str,
    pub name_en: &'static str,
    pub emoji: &'static str,
    pub category: SportCategory,
    pub positions: &'static [&'static str],
}

/// One entry of a plain option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub id: &'static str,
    pub name_fr: &'static str,
    pub name_en: &'static str,
    pub description: &'static str,
}

const fn choice(
    id: &'static str,
    name_fr: &'static str,
    name_en: &'static str,
    description: &'static str,
) -> Choice {
    Choice {
        id,
        name_fr,
        name_en,
        description,
    }
}

/// Pack id meaning "I'll pick modules myself".
pub const CUSTOM_PACK: &str = "custom";

/// Modules assumed when a profile is stored before any were chosen.
pub const DEFAULT_MODULES: &[&str] = &["sport", "nutrition", "sleep", "hydration"];

/// Onboarding minutes that do not depend on module choice.
pub const BASE_SETUP_MINUTES: u32 = 3;

pub static MODULES: &[ModuleInfo] = &[
    ModuleInfo {
        id: "sport",
        name_fr: "Sport & Performance",
        name_en: "Sport & Performance",
        description: "Programmes d'entraînement personnalisés selon votre sport",
        price_eur: 9,
        setup_minutes: 3,
    },
    ModuleInfo {
        id: "strength",
        name_fr: "Musculation",
        name_en: "Strength training",
        description: "Renforcement musculaire et développement physique",
        price_eur: 7,
        setup_minutes: 2,
    },
    ModuleInfo {
        id: "nutrition",
        name_fr: "Nutrition",
        name_en: "Nutrition",
        description: "Alimentation optimisée pour vos objectifs",
        price_eur: 7,
        setup_minutes: 2,
    },
    ModuleInfo {
        id: "sleep",
        name_fr: "Sommeil",
        name_en: "Sleep",
        description: "Optimisation de la récupération et du repos",
        price_eur: 5,
        setup_minutes: 1,
    },
    ModuleInfo {
        id: "hydration",
        name_fr: "Hydratation",
        name_en: "Hydration",
        description: "Suivi et optimisation de l'hydratation",
        price_eur: 5,
        setup_minutes: 1,
    },
    ModuleInfo {
        id: "wellness",
        name_fr: "Bien-être Global",
        name_en: "Overall wellness",
        description: "Approche holistique de la santé et du bien-être",
        price_eur: 4,
        setup_minutes: 1,
    },
];

pub static PACKS: &[PackInfo] = &[
    PackInfo {
        id: "performance",
        name_fr: "Performance Sportive",
        name_en: "Athletic performance",
        description: "Améliorer mes performances dans mon sport",
        modules: &["sport", "strength", "nutrition", "sleep"],
    },
    PackInfo {
        id: "health_wellness",
        name_fr: "Santé & Bien-être",
        name_en: "Health & wellness",
        description: "Maintenir une bonne santé générale",
        modules: &["nutrition", "sleep", "hydration", "wellness"],
    },
    PackInfo {
        id: "body_composition",
        name_fr: "Transformation Physique",
        name_en: "Body transformation",
        description: "Perdre du poids ou prendre du muscle",
        modules: &["strength", "nutrition", "hydration"],
    },
    PackInfo {
        id: "energy_sleep",
        name_fr: "Énergie & Récupération",
        name_en: "Energy & recovery",
        description: "Améliorer mon énergie et ma récupération",
        modules: &["sleep", "nutrition", "hydration", "wellness"],
    },
    PackInfo {
        id: "holistic",
        name_fr: "Accompagnement Complet",
        name_en: "Complete coaching",
        description: "Optimiser tous les aspects de ma vie",
        modules: &["sport", "strength", "nutrition", "sleep", "hydration", "wellness"],
    },
];

pub static SPORTS: &[SportInfo] = &[
    SportInfo {
        id: "football",
        name_fr: "Football",
        name_en: "Soccer",
        emoji: "⚽",
        category: SportCategory::Team,
        positions: &[
            "Gardien",
            "Défenseur central",
            "Latéral droit",
            "Latéral gauche",
            "Milieu défensif",
            "Milieu central",
            "Milieu offensif",
            "Ailier droit",
            "Ailier gauche",
            "Attaquant",
            "Avant-centre",
        ],
    },
    SportInfo {
        id: "basketball",
        name_fr: "Basketball",
        name_en: "Basketball",
        emoji: "🏀",
        category: SportCategory::Team,
        positions: &["Meneur (PG)", "Arrière (SG)", "Ailier (SF)", "Ailier Fort (PF)", "Pivot (C)"],
    },
    SportInfo {
        id: "rugby",
        name_fr: "Rugby",
        name_en: "Rugby",
        emoji: "🏉",
        category: SportCategory::Team,
        positions: &[
            "Pilier",
            "Talonneur",
            "Deuxième ligne",
            "Troisième ligne",
            "Demi de mêlée",
            "Demi d'ouverture",
            "Centre",
            "Ailier",
            "Arrière",
        ],
    },
    SportInfo {
        id: "tennis",
        name_fr: "Tennis",
        name_en: "Tennis",
        emoji: "🎾",
        category: SportCategory::Racket,
        positions: &["Joueur de fond de court", "Joueur offensif", "Joueur polyvalent"],
    },
    SportInfo {
        id: "american_football",
        name_fr: "Football Américain",
        name_en: "American football",
        emoji: "🏈",
        category: SportCategory::Team,
        positions: &[
            "Quarterback (QB)",
            "Running Back (RB)",
            "Wide Receiver (WR)",
            "Tight End (TE)",
            "Offensive Line",
            "Defensive Line",
            "Linebacker (LB)",
            "Cornerback (CB)",
            "Safety",
        ],
    },
    SportInfo {
        id: "volleyball",
        name_fr: "Volleyball",
        name_en: "Volleyball",
        emoji: "🏐",
        category: SportCategory::Team,
        positions: &["Passeur", "Attaquant", "Central", "Libéro", "Universel"],
    },
    SportInfo {
        id: "running",
        name_fr: "Course à Pied",
        name_en: "Running",
        emoji: "🏃",
        category: SportCategory::Endurance,
        positions: &["Sprint", "Demi-fond", "Fond", "Marathon", "Trail"],
    },
    SportInfo {
        id: "cycling",
        name_fr: "Cyclisme",
        name_en: "Cycling",
        emoji: "🚴",
        category: SportCategory::Endurance,
        positions: &["Route", "VTT", "Piste", "BMX"],
    },
    SportInfo {
        id: "swimming",
        name_fr: "Natation",
        name_en: "Swimming",
        emoji: "🏊",
        category: SportCategory::Endurance,
        positions: &["Nage libre", "Brasse", "Dos crawlé", "Papillon", "Quatre nages"],
    },
    SportInfo {
        id: "musculation",
        name_fr: "Musculation",
        name_en: "Weight training",
        emoji: "💪",
        category: SportCategory::Strength,
        positions: &["Bodybuilding", "Powerlifting", "Haltérophilie", "CrossFit", "Fitness général"],
    },
    SportInfo {
        id: "other",
        name_fr: "Autre sport",
        name_en: "Other sport",
        emoji: "🎯",
        category: SportCategory::Other,
        positions: &[],
    },
];

// ── Option lists ────────────────────────────────────────────────────────

/// Main objectives offered by the conversational flow. Ids match the
/// fitness-goal remap applied when the profile is stored.
pub static MAIN_OBJECTIVES: &[Choice] = &[
    choice("performance", "Performance Sportive", "Athletic performance", "Améliorer mes performances dans mon sport"),
    choice("health_wellness", "Santé & Bien-être", "Health & wellness", "Maintenir une bonne santé générale"),
    choice("body_composition", "Transformation Physique", "Body transformation", "Perdre du poids ou prendre du muscle"),
    choice("energy_sleep", "Énergie & Récupération", "Energy & recovery", "Améliorer mon énergie et ma récupération"),
    choice("strength_building", "Gagner en force", "Build strength", "Devenir plus fort"),
    choice("endurance_cardio", "Endurance & Cardio", "Endurance & cardio", "Tenir plus longtemps"),
    choice("recovery_focus", "Récupération", "Recovery", "Mieux récupérer entre les séances"),
    choice("weight_management", "Gestion du poids", "Weight management", "Stabiliser mon poids"),
];

pub static LIFESTYLES: &[Choice] = &[
    choice("student", "Étudiant(e)", "Student", "Horaires flexibles, budget étudiant"),
    choice("office_worker", "Travail de Bureau", "Office worker", "Sédentaire, horaires fixes"),
    choice("physical_job", "Travail Physique", "Physical job", "Activité physique professionnelle"),
    choice("retired", "Retraité(e)", "Retired", "Temps libre, focus santé"),
];

pub static GENDERS: &[Choice] = &[
    choice("male", "Homme", "Male", ""),
    choice("female", "Femme", "Female", ""),
    choice("other", "Autre", "Other", ""),
];

pub static SPORT_LEVELS: &[Choice] = &[
    choice("recreational", "Loisir", "Recreational", "Pour le plaisir et la forme"),
    choice("amateur_competitive", "Amateur Compétitif", "Competitive amateur", "Compétitions locales/régionales"),
    choice("semi_professional", "Semi-Professionnel", "Semi-professional", "Niveau élevé, entraînement intensif"),
    choice("professional", "Professionnel", "Professional", "Sport de haut niveau"),
];

pub static SEASON_PERIODS: &[Choice] = &[
    choice("off_season", "Hors Saison", "Off-season", "Période de récupération et préparation"),
    choice("pre_season", "Pré-Saison", "Pre-season", "Préparation pour la saison"),
    choice("in_season", "En Saison", "In season", "Période de compétition"),
    choice("recovery", "Récupération", "Recovery", "Phase de récupération active"),
];

pub static EQUIPMENT_LEVELS: &[Choice] = &[
    choice("no_equipment", "Aucun Matériel", "No equipment", "Entraînements au poids du corps"),
    choice("minimal_equipment", "Matériel Minimal", "Minimal equipment", "Élastiques, poids légers"),
    choice("some_equipment", "Équipement Partiel", "Some equipment", "Home gym de base"),
    choice("full_gym", "Salle Complète", "Full gym", "Accès à une salle de sport"),
];

pub static STRENGTH_OBJECTIVES: &[Choice] = &[
    choice("strength", "Force Pure", "Maximal strength", "Développer la force maximale"),
    choice("power", "Puissance Explosive", "Explosive power", "Améliorer l'explosivité"),
    choice("hypertrophy", "Prise de Masse", "Hypertrophy", "Développer le volume musculaire"),
    choice("injury_prevention", "Prévention Blessures", "Injury prevention", "Renforcer pour éviter les blessures"),
    choice("endurance", "Endurance Musculaire", "Muscular endurance", "Améliorer la résistance"),
];

pub static FITNESS_EXPERIENCE: &[Choice] = &[
    choice("beginner", "Débutant", "Beginner", "Moins de 6 mois d'expérience"),
    choice("intermediate", "Intermédiaire", "Intermediate", "6 mois à 2 ans d'expérience"),
    choice("advanced", "Avancé", "Advanced", "2 à 5 ans d'expérience"),
    choice("expert", "Expert", "Expert", "Plus de 5 ans d'expérience"),
];

pub static DIETARY_PREFERENCES: &[Choice] = &[
    choice("omnivore", "Omnivore", "Omnivore", "Je mange de tout"),
    choice("vegetarian", "Végétarien", "Vegetarian", "Pas de viande ni poisson"),
    choice("vegan", "Végétalien", "Vegan", "Aucun produit animal"),
    choice("pescatarian", "Pescétarien", "Pescatarian", "Poisson mais pas de viande"),
    choice("flexitarian", "Flexitarien", "Flexitarian", "Principalement végétarien"),
    choice("keto", "Cétogène", "Keto", "Très faible en glucides"),
    choice("paleo", "Paléo", "Paleo", "Aliments non transformés"),
    choice("mediterranean", "Méditerranéen", "Mediterranean", "Régime méditerranéen"),
];

pub static NUTRITION_OBJECTIVES: &[Choice] = &[
    choice("muscle_gain", "Prise de Masse", "Muscle gain", "Développer la masse musculaire"),
    choice("weight_loss", "Perte de Poids", "Weight loss", "Réduire la masse grasse"),
    choice("maintenance", "Maintien", "Maintenance", "Maintenir mon poids actuel"),
    choice("performance", "Performance", "Performance", "Optimiser pour le sport"),
];

pub static COMMON_ALLERGIES: &[Choice] = &[
    choice("gluten", "Gluten", "Gluten", ""),
    choice("lactose", "Lactose", "Lactose", ""),
    choice("tree_nuts", "Fruits à coque", "Tree nuts", ""),
    choice("peanuts", "Arachides", "Peanuts", ""),
    choice("eggs", "Œufs", "Eggs", ""),
    choice("fish", "Poisson", "Fish", ""),
    choice("shellfish", "Crustacés", "Shellfish", ""),
    choice("soy", "Soja", "Soy", ""),
    choice("sesame", "Sésame", "Sesame", ""),
];

pub static SLEEP_DIFFICULTIES: &[Choice] = &[
    choice("falling_asleep", "Endormissement", "Falling asleep", "J'ai du mal à m'endormir"),
    choice("night_waking", "Réveils nocturnes", "Waking at night", "Je me réveille pendant la nuit"),
    choice("early_waking", "Réveil précoce", "Waking too early", "Je me réveille trop tôt"),
    choice("irregular_schedule", "Horaires irréguliers", "Irregular schedule", "Mes horaires changent souvent"),
];

/// Profile types of the questionnaire flow.
pub static PROFILE_TYPES: &[Choice] = &[
    choice("complete", "Profil complet", "Complete profile", "Sport, nutrition, sommeil et hydratation"),
    choice("wellness", "Bien-être", "Wellness", "Nutrition, sommeil et hydratation"),
    choice("sport_only", "Sport uniquement", "Sport only", "Entraînement et performance"),
    choice("sleep_focus", "Focus sommeil", "Sleep focus", "Sommeil et hydratation"),
];

// Questionnaire goals, offered per profile type. Up to three may be chosen.

const GOAL_PERFORMANCE: Choice = choice("performance", "Performance sportive", "Athletic performance", "Améliorer mes performances");
const GOAL_MUSCLE_GAIN: Choice = choice("muscle_gain", "Prise de muscle", "Muscle gain", "Développer ma masse musculaire");
const GOAL_WEIGHT_LOSS: Choice = choice("weight_loss", "Perte de poids", "Weight loss", "Perdre du poids");
const GOAL_ENDURANCE: Choice = choice("endurance", "Condition physique", "Fitness", "Améliorer mon endurance");
const GOAL_RECOVERY: Choice = choice("recovery", "Récupération", "Recovery", "Mieux récupérer");
const GOAL_ENERGY: Choice = choice("energy", "Énergie", "Energy", "Plus d'énergie au quotidien");
const GOAL_SLEEP_QUALITY: Choice = choice("sleep_quality", "Qualité sommeil", "Sleep quality", "Mieux dormir");
const GOAL_GENERAL_HEALTH: Choice = choice("general_health", "Santé générale", "General health", "Mode de vie plus sain");
const GOAL_STRENGTH: Choice = choice("strength", "Force pure", "Pure strength", "Devenir plus fort");

static COMPLETE_GOALS: &[Choice] = &[
    GOAL_PERFORMANCE,
    GOAL_MUSCLE_GAIN,
    GOAL_WEIGHT_LOSS,
    GOAL_ENDURANCE,
    GOAL_RECOVERY,
    GOAL_ENERGY,
    GOAL_SLEEP_QUALITY,
    GOAL_GENERAL_HEALTH,
];
static WELLNESS_GOALS: &[Choice] = &[
    GOAL_WEIGHT_LOSS,
    GOAL_RECOVERY,
    GOAL_ENERGY,
    GOAL_SLEEP_QUALITY,
    GOAL_GENERAL_HEALTH,
];
static SPORT_ONLY_GOALS: &[Choice] = &[GOAL_PERFORMANCE, GOAL_MUSCLE_GAIN, GOAL_ENDURANCE, GOAL_STRENGTH];
static SLEEP_FOCUS_GOALS: &[Choice] = &[GOAL_SLEEP_QUALITY, GOAL_RECOVERY, GOAL_ENERGY, GOAL_GENERAL_HEALTH];

/// Goals offered to a questionnaire profile type; unknown types get the
/// complete list.
pub fn goals_for_profile(profile_type: &str) -> &'static [Choice] {
    match profile_type {
        "wellness" => WELLNESS_GOALS,
        "sport_only" => SPORT_ONLY_GOALS,
        "sleep_focus" => SLEEP_FOCUS_GOALS,
        _ => COMPLETE_GOALS,
    }
}

/// Modules activated by each questionnaire profile type.
pub fn profile_type_modules(profile_type: &str) -> &'static [&'static str] {
    match profile_type {
        "complete" => &["sport", "nutrition", "sleep", "hydration"],
        "wellness" => &["nutrition", "sleep", "hydration"],
        "sport_only" => &["sport"],
        "sleep_focus" => &["sleep", "hydration"],
        _ => &["sport"],
    }
}

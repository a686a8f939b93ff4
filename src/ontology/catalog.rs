//! Builtin sensor catalog
//!
//! Canonical sensor identifiers with their bilingual synonym sets, units
//! and feature-context tags. Synonym strings are written in canonical
//! matching form (see `normalize::fold_text`); sets must stay disjoint
//! across entries or ontology construction fails at startup.

/// One catalog row. `context` groups sensors under a UI feature tab;
/// `None` means the sensor belongs to no tab and is only reachable by
/// naming it.
pub(crate) struct CatalogEntry {
    pub id: &'static str,
    pub display_en: &'static str,
    pub display_fa: &'static str,
    pub unit: &'static str,
    pub context: Option<&'static str>,
    pub english: &'static [&'static str],
    pub persian: &'static [&'static str],
}

/// Feature contexts with their member sensors in priority order; the
/// first member is the default entity when a query in that context names
/// no sensor. `dashboard` is deliberately absent: it is the unrestricted
/// context.
pub(crate) const CONTEXTS: &[(&str, &[&str])] = &[
    (
        "environment",
        &[
            "temperature",
            "humidity",
            "pressure",
            "light",
            "co2_level",
            "wind_speed",
            "rainfall",
        ],
    ),
    (
        "irrigation",
        &[
            "soil_moisture",
            "water_usage",
            "water_efficiency",
            "soil_ph",
            "soil_temperature",
        ],
    ),
    (
        "growth",
        &[
            "plant_height",
            "fruit_count",
            "fruit_size",
            "leaf_count",
            "leaf_wetness",
        ],
    ),
    (
        "nutrients",
        &[
            "nitrogen_level",
            "phosphorus_level",
            "potassium_level",
            "nutrient_uptake",
            "fertilizer_usage",
        ],
    ),
    ("pest", &["pest_count", "pest_detection", "disease_risk"]),
    ("production", &["yield_prediction", "yield_efficiency"]),
    (
        "market",
        &[
            "tomato_price",
            "lettuce_price",
            "pepper_price",
            "demand_level",
            "supply_level",
            "profit_margin",
        ],
    ),
    ("energy", &["energy_usage"]),
];

pub(crate) const CATALOG: &[CatalogEntry] = &[
    // Environmental sensors
    CatalogEntry {
        id: "temperature",
        display_en: "Temperature",
        display_fa: "دما",
        unit: "°C",
        context: Some("environment"),
        english: &[
            "temperature",
            "temp",
            "heat",
            "thermal",
            "air temperature",
            "degree",
            "ambient temperature",
            "greenhouse temperature",
        ],
        persian: &[
            "دما",
            // Ezafe form; compounds like "دمای خاک" still win by length.
            "دمای",
            "گرما",
            "حرارت",
            "درجه حرارت",
            "دمای هوا",
            "درجه",
            "دمای محیط",
            "دمای گلخانه",
            "حرارت گلخانه",
        ],
    },
    CatalogEntry {
        id: "humidity",
        display_en: "Humidity",
        display_fa: "رطوبت",
        unit: "%",
        context: Some("environment"),
        english: &[
            "humidity",
            "moisture",
            "dampness",
            "air humidity",
            "ambient humidity",
            "relative humidity",
            "greenhouse humidity",
        ],
        persian: &[
            "رطوبت",
            "نم",
            "شرجی",
            "رطوبت هوا",
            "رطوبت محیط",
            "رطوبت گلخانه",
            "رطوبت نسبی",
        ],
    },
    CatalogEntry {
        id: "pressure",
        display_en: "Pressure",
        display_fa: "فشار هوا",
        unit: "hPa",
        context: Some("environment"),
        english: &["pressure", "atmospheric pressure", "barometric pressure"],
        persian: &["فشار", "بارومتر", "فشار هوا"],
    },
    CatalogEntry {
        id: "light",
        display_en: "Light",
        display_fa: "نور",
        unit: "lux",
        context: Some("environment"),
        english: &["light", "brightness", "illumination", "lux"],
        persian: &["نور", "روشنایی", "نور خورشید"],
    },
    CatalogEntry {
        id: "co2_level",
        display_en: "CO2 Level",
        display_fa: "دی اکسید کربن",
        unit: "ppm",
        context: Some("environment"),
        english: &["co2", "carbon dioxide", "co2 level"],
        persian: &["دی اکسید کربن", "کربن دی اکسید"],
    },
    CatalogEntry {
        id: "wind_speed",
        display_en: "Wind Speed",
        display_fa: "سرعت باد",
        unit: "m/s",
        context: Some("environment"),
        english: &["wind", "wind speed", "air velocity"],
        persian: &["سرعت باد", "باد", "سرعت وزش باد"],
    },
    CatalogEntry {
        id: "rainfall",
        display_en: "Rainfall",
        display_fa: "بارندگی",
        unit: "mm",
        context: Some("environment"),
        english: &["rain", "rainfall", "precipitation"],
        persian: &["باران", "بارندگی", "میزان باران"],
    },
    // Soil and irrigation
    CatalogEntry {
        id: "soil_moisture",
        display_en: "Soil Moisture",
        display_fa: "رطوبت خاک",
        unit: "%",
        context: Some("irrigation"),
        english: &[
            "soil moisture",
            "soil water",
            "ground moisture",
            "soil",
            "ground",
            "substrate",
            "soil wetness",
        ],
        persian: &[
            "رطوبت خاک",
            "نم خاک",
            "آب خاک",
            "خاک",
            "زمین",
            "بستر",
            "رطوبت زمین",
            "رطوبت بستر",
        ],
    },
    CatalogEntry {
        id: "soil_ph",
        display_en: "Soil pH",
        display_fa: "اسیدیته خاک",
        unit: "pH",
        context: Some("irrigation"),
        english: &["soil ph", "soil acidity", "ph level"],
        persian: &["پی اچ خاک", "اسیدیته خاک", "ph خاک"],
    },
    CatalogEntry {
        id: "soil_temperature",
        display_en: "Soil Temperature",
        display_fa: "دمای خاک",
        unit: "°C",
        context: Some("irrigation"),
        english: &["soil temperature", "ground temperature"],
        persian: &["دمای خاک", "حرارت خاک", "گرمای خاک"],
    },
    CatalogEntry {
        id: "water_usage",
        display_en: "Water Usage",
        display_fa: "مصرف آب",
        unit: "L",
        context: Some("irrigation"),
        english: &[
            "water usage",
            "water consumption",
            "water used",
            "irrigation",
            "watering",
            "water",
            "water amount",
            "water volume",
        ],
        persian: &[
            "مصرف آب",
            "استفاده آب",
            "آب مصرفی",
            "آبیاری",
            "ابیاری",
            "آب",
            "مقدار آب",
            "حجم آب",
        ],
    },
    CatalogEntry {
        id: "water_efficiency",
        display_en: "Water Efficiency",
        display_fa: "بازدهی آب",
        unit: "%",
        context: Some("irrigation"),
        english: &["water efficiency", "water optimization"],
        persian: &["بازدهی آب", "کارایی آب", "مصرف بهینه آب"],
    },
    // Plant growth
    CatalogEntry {
        id: "plant_height",
        display_en: "Plant Height",
        display_fa: "ارتفاع گیاه",
        unit: "cm",
        context: Some("growth"),
        english: &["plant height", "plant growth", "height"],
        persian: &["قد گیاه", "ارتفاع گیاه", "بلندی گیاه"],
    },
    CatalogEntry {
        id: "fruit_count",
        display_en: "Fruit Count",
        display_fa: "تعداد میوه",
        unit: "count",
        context: Some("growth"),
        english: &["fruit count", "fruit number", "fruits", "fruit"],
        persian: &["تعداد میوه", "شمار میوه", "میوه ها", "میوه"],
    },
    CatalogEntry {
        id: "fruit_size",
        display_en: "Fruit Size",
        display_fa: "اندازه میوه",
        unit: "cm",
        context: Some("growth"),
        english: &["fruit size", "fruit diameter"],
        persian: &["اندازه میوه", "سایز میوه", "بزرگی میوه"],
    },
    CatalogEntry {
        id: "leaf_count",
        display_en: "Leaf Count",
        display_fa: "تعداد برگ",
        unit: "count",
        context: Some("growth"),
        english: &["leaf count", "leaf number", "leaves"],
        persian: &["تعداد برگ", "شمار برگ", "برگ ها"],
    },
    CatalogEntry {
        id: "leaf_wetness",
        display_en: "Leaf Wetness",
        display_fa: "رطوبت برگ",
        unit: "%",
        context: Some("growth"),
        english: &["leaf wetness", "leaf moisture", "foliar wetness", "leaf"],
        persian: &["رطوبت برگ", "نم برگ", "برگ"],
    },
    // Nutrients
    CatalogEntry {
        id: "nitrogen_level",
        display_en: "Nitrogen Level",
        display_fa: "نیتروژن",
        unit: "ppm",
        context: Some("nutrients"),
        english: &["nitrogen", "n level", "nitrogen content"],
        persian: &["نیتروژن", "ازت", "سطح نیتروژن"],
    },
    CatalogEntry {
        id: "phosphorus_level",
        display_en: "Phosphorus Level",
        display_fa: "فسفر",
        unit: "ppm",
        context: Some("nutrients"),
        english: &["phosphorus", "p level", "phosphorus content"],
        persian: &["فسفر", "سطح فسفر", "مقدار فسفر"],
    },
    CatalogEntry {
        id: "potassium_level",
        display_en: "Potassium Level",
        display_fa: "پتاسیم",
        unit: "ppm",
        context: Some("nutrients"),
        english: &["potassium", "k level", "potassium content"],
        persian: &["پتاسیم", "سطح پتاسیم", "مقدار پتاسیم"],
    },
    CatalogEntry {
        id: "nutrient_uptake",
        display_en: "Nutrient Uptake",
        display_fa: "جذب مواد مغذی",
        unit: "mg/L",
        context: Some("nutrients"),
        english: &["nutrient uptake", "nutrient absorption", "nutrients"],
        persian: &["جذب مواد مغذی", "مصرف مواد مغذی", "مواد مغذی"],
    },
    CatalogEntry {
        id: "fertilizer_usage",
        display_en: "Fertilizer Usage",
        display_fa: "مصرف کود",
        unit: "kg",
        context: Some("nutrients"),
        english: &["fertilizer usage", "fertilizer consumption", "fertilizer"],
        persian: &["مصرف کود", "استفاده کود", "کود"],
    },
    // Pest and disease
    CatalogEntry {
        id: "pest_count",
        display_en: "Pest Count",
        display_fa: "تعداد آفت",
        unit: "count",
        context: Some("pest"),
        english: &[
            "pest count",
            "pest number",
            "pests",
            "pest",
            "insect",
            "insects",
            "flies",
            "worms",
            "larvae",
            "harmful insects",
        ],
        persian: &[
            "تعداد آفت",
            "شمار آفت",
            "آفات",
            "آفت",
            "حشره",
            "حشرات",
            "مگس",
            "مگسها",
            "کرم",
            "کرمها",
            "لارو",
            "رشد آفات",
            "افزایش آفات",
        ],
    },
    CatalogEntry {
        id: "pest_detection",
        display_en: "Pest Detection",
        display_fa: "تشخیص آفت",
        unit: "binary",
        context: Some("pest"),
        english: &["pest detection", "pest identified"],
        persian: &["تشخیص آفت", "شناسایی آفت", "آفت یابی"],
    },
    CatalogEntry {
        id: "disease_risk",
        display_en: "Disease Risk",
        display_fa: "خطر بیماری",
        unit: "%",
        context: Some("pest"),
        english: &["disease risk", "disease probability", "disease"],
        persian: &["خطر بیماری", "ریسک بیماری", "احتمال بیماری", "بیماری"],
    },
    // Yield and production
    CatalogEntry {
        id: "yield_prediction",
        display_en: "Yield Prediction",
        display_fa: "پیش بینی محصول",
        unit: "kg",
        context: Some("production"),
        english: &["yield prediction", "crop yield", "predicted yield", "yield"],
        persian: &["پیش بینی محصول", "تخمین محصول", "محصول"],
    },
    CatalogEntry {
        id: "yield_efficiency",
        display_en: "Yield Efficiency",
        display_fa: "بازدهی محصول",
        unit: "%",
        context: Some("production"),
        english: &["yield efficiency", "production efficiency"],
        persian: &["بازدهی محصول", "کارایی محصول", "بهره وری"],
    },
    // Market and economics
    CatalogEntry {
        id: "tomato_price",
        display_en: "Tomato Price",
        display_fa: "قیمت گوجه",
        unit: "price_per_kg",
        context: Some("market"),
        english: &["tomato price", "tomato"],
        persian: &["قیمت گوجه", "بهای گوجه", "گوجه"],
    },
    CatalogEntry {
        id: "lettuce_price",
        display_en: "Lettuce Price",
        display_fa: "قیمت کاهو",
        unit: "price_per_head",
        context: Some("market"),
        english: &["lettuce price", "lettuce"],
        persian: &["قیمت کاهو", "بهای کاهو", "کاهو"],
    },
    CatalogEntry {
        id: "pepper_price",
        display_en: "Pepper Price",
        display_fa: "قیمت فلفل",
        unit: "price_per_kg",
        context: Some("market"),
        english: &["pepper price", "pepper"],
        persian: &["قیمت فلفل", "بهای فلفل", "فلفل"],
    },
    CatalogEntry {
        id: "demand_level",
        display_en: "Demand Level",
        display_fa: "سطح تقاضا",
        unit: "level",
        context: Some("market"),
        english: &["demand level", "demand", "market demand"],
        persian: &["سطح تقاضا", "میزان تقاضا", "تقاضا"],
    },
    CatalogEntry {
        id: "supply_level",
        display_en: "Supply Level",
        display_fa: "سطح عرضه",
        unit: "%",
        context: Some("market"),
        english: &["supply level", "supply", "market supply"],
        persian: &["سطح عرضه", "میزان عرضه", "عرضه"],
    },
    CatalogEntry {
        id: "profit_margin",
        display_en: "Profit Margin",
        display_fa: "حاشیه سود",
        unit: "%",
        context: Some("market"),
        english: &["profit margin", "profit", "revenue"],
        persian: &["حاشیه سود", "سود", "درآمد"],
    },
    // Other
    CatalogEntry {
        id: "motion",
        display_en: "Motion",
        display_fa: "حرکت",
        unit: "count",
        context: None,
        english: &["motion", "movement", "activity"],
        persian: &["حرکت", "جنبش", "فعالیت"],
    },
    CatalogEntry {
        id: "energy_usage",
        display_en: "Energy Usage",
        display_fa: "مصرف انرژی",
        unit: "kWh",
        context: Some("energy"),
        english: &["energy usage", "power consumption", "energy"],
        persian: &["مصرف انرژی", "استفاده برق", "انرژی"],
    },
    CatalogEntry {
        id: "test_temperature",
        display_en: "Test Temperature",
        display_fa: "دمای آزمایش",
        unit: "°C",
        context: None,
        english: &["test temperature", "experimental temperature"],
        persian: &["دما تست", "دمای آزمایش", "تست دما"],
    },
];

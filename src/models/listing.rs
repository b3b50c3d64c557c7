//! Listing model
//!
//! Every marketplace entry (a rental flat, a used bike, a tuition class...)
//! is a `Listing`. The category it belongs to is a `ListingKind`; fields that
//! only make sense for one kind live in the `attributes` JSON object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Top-level grouping of listing kinds, used by the search `category` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingSection {
    RealEstateProperty,
    VehiclesTransportation,
    ElectronicsTechnology,
    FashionLifestyle,
    FurnitureHome,
    Services,
    EducationLearning,
}

impl ListingSection {
    pub const ALL: [ListingSection; 7] = [
        ListingSection::RealEstateProperty,
        ListingSection::VehiclesTransportation,
        ListingSection::ElectronicsTechnology,
        ListingSection::FashionLifestyle,
        ListingSection::FurnitureHome,
        ListingSection::Services,
        ListingSection::EducationLearning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingSection::RealEstateProperty => "real-estate-property",
            ListingSection::VehiclesTransportation => "vehicles-transportation",
            ListingSection::ElectronicsTechnology => "electronics-technology",
            ListingSection::FashionLifestyle => "fashion-lifestyle",
            ListingSection::FurnitureHome => "furniture-home",
            ListingSection::Services => "services",
            ListingSection::EducationLearning => "education-learning",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.as_str() == s)
    }
}

/// The category a listing is published under.
///
/// Serialized as its URL slug (`rental-listings`, `hostel-pg`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingKind {
    // Real estate & property
    RentalListings,
    HostelPg,
    ConstructionMaterials,
    PropertyDeals,
    CommercialProperties,
    IndustrialLand,
    OfficeSpaces,
    // Vehicles & transportation
    CarsBikes,
    Showrooms,
    HeavyEquipment,
    SecondHandCarsBikes,
    CarBikeRentals,
    TransportationMovingServices,
    VehicleLicenseClasses,
    // Electronics & technology
    ElectronicsGadgets,
    PhonesTabletsAccessories,
    SecondHandPhonesTabletsAccessories,
    ComputerMobileLaptopRepairServices,
    CyberCafeInternetServices,
    TelecommunicationServices,
    ServiceCentreWarranty,
    // Fashion & lifestyle
    FashionBeautyProducts,
    JewelryAccessories,
    SareeClothingShopping,
    // Furniture & home
    FurnitureInteriorDecor,
    // Services
    HouseholdServices,
    EventDecorationServices,
    HealthWellnessServices,
    PharmacyMedicalStores,
    // Education & learning
    TuitionPrivateClasses,
    LanguageClasses,
    DanceKarateGymYoga,
    AcademiesMusicArtsSports,
    SkillTrainingCertification,
    SchoolsCollegesCoaching,
    EducationalConsultancyStudyAbroad,
    EbooksOnlineCourses,
    CricketSportsTraining,
}

impl ListingKind {
    pub const ALL: [ListingKind; 38] = [
        ListingKind::RentalListings,
        ListingKind::HostelPg,
        ListingKind::ConstructionMaterials,
        ListingKind::PropertyDeals,
        ListingKind::CommercialProperties,
        ListingKind::IndustrialLand,
        ListingKind::OfficeSpaces,
        ListingKind::CarsBikes,
        ListingKind::Showrooms,
        ListingKind::HeavyEquipment,
        ListingKind::SecondHandCarsBikes,
        ListingKind::CarBikeRentals,
        ListingKind::TransportationMovingServices,
        ListingKind::VehicleLicenseClasses,
        ListingKind::ElectronicsGadgets,
        ListingKind::PhonesTabletsAccessories,
        ListingKind::SecondHandPhonesTabletsAccessories,
        ListingKind::ComputerMobileLaptopRepairServices,
        ListingKind::CyberCafeInternetServices,
        ListingKind::TelecommunicationServices,
        ListingKind::ServiceCentreWarranty,
        ListingKind::FashionBeautyProducts,
        ListingKind::JewelryAccessories,
        ListingKind::SareeClothingShopping,
        ListingKind::FurnitureInteriorDecor,
        ListingKind::HouseholdServices,
        ListingKind::EventDecorationServices,
        ListingKind::HealthWellnessServices,
        ListingKind::PharmacyMedicalStores,
        ListingKind::TuitionPrivateClasses,
        ListingKind::LanguageClasses,
        ListingKind::DanceKarateGymYoga,
        ListingKind::AcademiesMusicArtsSports,
        ListingKind::SkillTrainingCertification,
        ListingKind::SchoolsCollegesCoaching,
        ListingKind::EducationalConsultancyStudyAbroad,
        ListingKind::EbooksOnlineCourses,
        ListingKind::CricketSportsTraining,
    ];

    /// URL slug, also the value stored in `listings.kind`
    pub fn slug(&self) -> &'static str {
        use ListingKind::*;
        match self {
            RentalListings => "rental-listings",
            HostelPg => "hostel-pg",
            ConstructionMaterials => "construction-materials",
            PropertyDeals => "property-deals",
            CommercialProperties => "commercial-properties",
            IndustrialLand => "industrial-land",
            OfficeSpaces => "office-spaces",
            CarsBikes => "cars-bikes",
            Showrooms => "showrooms",
            HeavyEquipment => "heavy-equipment",
            SecondHandCarsBikes => "second-hand-cars-bikes",
            CarBikeRentals => "car-bike-rentals",
            TransportationMovingServices => "transportation-moving-services",
            VehicleLicenseClasses => "vehicle-license-classes",
            ElectronicsGadgets => "electronics-gadgets",
            PhonesTabletsAccessories => "phones-tablets-accessories",
            SecondHandPhonesTabletsAccessories => "second-hand-phones-tablets-accessories",
            ComputerMobileLaptopRepairServices => "computer-mobile-laptop-repair-services",
            CyberCafeInternetServices => "cyber-cafe-internet-services",
            TelecommunicationServices => "telecommunication-services",
            ServiceCentreWarranty => "service-centre-warranty",
            FashionBeautyProducts => "fashion-beauty-products",
            JewelryAccessories => "jewelry-accessories",
            SareeClothingShopping => "saree-clothing-shopping",
            FurnitureInteriorDecor => "furniture-interior-decor",
            HouseholdServices => "household-services",
            EventDecorationServices => "event-decoration-services",
            HealthWellnessServices => "health-wellness-services",
            PharmacyMedicalStores => "pharmacy-medical-stores",
            TuitionPrivateClasses => "tuition-private-classes",
            LanguageClasses => "language-classes",
            DanceKarateGymYoga => "dance-karate-gym-yoga",
            AcademiesMusicArtsSports => "academies-music-arts-sports",
            SkillTrainingCertification => "skill-training-certification",
            SchoolsCollegesCoaching => "schools-colleges-coaching",
            EducationalConsultancyStudyAbroad => "educational-consultancy-study-abroad",
            EbooksOnlineCourses => "ebooks-online-courses",
            CricketSportsTraining => "cricket-sports-training",
        }
    }

    /// Key under which search results for this kind are grouped
    pub fn search_group(&self) -> &'static str {
        use ListingKind::*;
        match self {
            RentalListings => "rentalListings",
            HostelPg => "hostelPg",
            ConstructionMaterials => "constructionMaterials",
            PropertyDeals => "propertyDeals",
            CommercialProperties => "commercialProperties",
            IndustrialLand => "industrialLand",
            OfficeSpaces => "officeSpaces",
            CarsBikes => "cars",
            Showrooms => "showrooms",
            HeavyEquipment => "heavyEquipment",
            SecondHandCarsBikes => "secondHandCars",
            CarBikeRentals => "carBikeRentals",
            TransportationMovingServices => "transportation",
            VehicleLicenseClasses => "vehicleLicense",
            ElectronicsGadgets => "electronics",
            PhonesTabletsAccessories => "phones",
            SecondHandPhonesTabletsAccessories => "secondHandPhones",
            ComputerMobileLaptopRepairServices => "computerRepair",
            CyberCafeInternetServices => "cyberCafe",
            TelecommunicationServices => "telecommunication",
            ServiceCentreWarranty => "serviceCentre",
            FashionBeautyProducts => "fashion",
            JewelryAccessories => "jewelry",
            SareeClothingShopping => "sareeClothing",
            FurnitureInteriorDecor => "furniture",
            HouseholdServices => "household",
            EventDecorationServices => "eventDecoration",
            HealthWellnessServices => "healthWellness",
            PharmacyMedicalStores => "pharmacy",
            TuitionPrivateClasses => "tuition",
            LanguageClasses => "languageClasses",
            DanceKarateGymYoga => "dance",
            AcademiesMusicArtsSports => "academies",
            SkillTrainingCertification => "skillTraining",
            SchoolsCollegesCoaching => "schools",
            EducationalConsultancyStudyAbroad => "educationalConsultancy",
            EbooksOnlineCourses => "ebooks",
            CricketSportsTraining => "cricketTraining",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        use ListingKind::*;
        match self {
            RentalListings => "Rental Listings",
            HostelPg => "Hostel & PG",
            ConstructionMaterials => "Construction Materials",
            PropertyDeals => "Property Deals",
            CommercialProperties => "Commercial Properties",
            IndustrialLand => "Industrial Land",
            OfficeSpaces => "Office Spaces",
            CarsBikes => "Cars & Bikes",
            Showrooms => "Showrooms",
            HeavyEquipment => "Heavy Equipment",
            SecondHandCarsBikes => "Second Hand Cars & Bikes",
            CarBikeRentals => "Car & Bike Rentals",
            TransportationMovingServices => "Transportation & Moving Services",
            VehicleLicenseClasses => "Vehicle License Classes",
            ElectronicsGadgets => "Electronics & Gadgets",
            PhonesTabletsAccessories => "Phones, Tablets & Accessories",
            SecondHandPhonesTabletsAccessories => "Second Hand Phones & Accessories",
            ComputerMobileLaptopRepairServices => "Computer, Mobile & Laptop Repair Services",
            CyberCafeInternetServices => "Cyber Café / Internet Services",
            TelecommunicationServices => "Telecommunication Services",
            ServiceCentreWarranty => "Service Centre / Warranty",
            FashionBeautyProducts => "Fashion & Beauty Products",
            JewelryAccessories => "Jewelry & Accessories",
            SareeClothingShopping => "Saree & Clothing Shopping",
            FurnitureInteriorDecor => "Furniture & Interior Decor",
            HouseholdServices => "Household Services",
            EventDecorationServices => "Event & Decoration Services",
            HealthWellnessServices => "Health & Wellness Services",
            PharmacyMedicalStores => "Pharmacy & Medical Stores",
            TuitionPrivateClasses => "Tuition & Private Classes",
            LanguageClasses => "Language Classes",
            DanceKarateGymYoga => "Dance, Karate, Gym & Yoga",
            AcademiesMusicArtsSports => "Academies - Music, Arts, Sports",
            SkillTrainingCertification => "Skill Training & Certification",
            SchoolsCollegesCoaching => "Schools, Colleges & Coaching",
            EducationalConsultancyStudyAbroad => "Educational Consultancy & Study Abroad",
            EbooksOnlineCourses => "E-Books & Online Courses",
            CricketSportsTraining => "Cricket & Sports Training",
        }
    }

    pub fn section(&self) -> ListingSection {
        use ListingKind::*;
        match self {
            RentalListings | HostelPg | ConstructionMaterials | PropertyDeals
            | CommercialProperties | IndustrialLand | OfficeSpaces => {
                ListingSection::RealEstateProperty
            }
            CarsBikes | Showrooms | HeavyEquipment | SecondHandCarsBikes | CarBikeRentals
            | TransportationMovingServices | VehicleLicenseClasses => {
                ListingSection::VehiclesTransportation
            }
            ElectronicsGadgets | PhonesTabletsAccessories | SecondHandPhonesTabletsAccessories
            | ComputerMobileLaptopRepairServices | CyberCafeInternetServices
            | TelecommunicationServices | ServiceCentreWarranty => {
                ListingSection::ElectronicsTechnology
            }
            FashionBeautyProducts | JewelryAccessories | SareeClothingShopping => {
                ListingSection::FashionLifestyle
            }
            FurnitureInteriorDecor => ListingSection::FurnitureHome,
            HouseholdServices | EventDecorationServices | HealthWellnessServices
            | PharmacyMedicalStores => ListingSection::Services,
            TuitionPrivateClasses | LanguageClasses | DanceKarateGymYoga
            | AcademiesMusicArtsSports | SkillTrainingCertification | SchoolsCollegesCoaching
            | EducationalConsultancyStudyAbroad | EbooksOnlineCourses | CricketSportsTraining => {
                ListingSection::EducationLearning
            }
        }
    }

    /// Look a kind up by its search group key
    pub fn from_search_group(group: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.search_group() == group)
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ListingKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown listing category: {}", s))
    }
}

/// A marketplace listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    pub kind: ListingKind,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    /// Image URLs in display order
    pub images: Vec<String>,
    /// Free-text category or subcategory label chosen by the poster
    pub category: Option<String>,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    /// Locality within the city
    pub area: Option<String>,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub location_id: Option<i64>,
    /// Owner, when the listing was posted by a registered user
    pub user_id: Option<i64>,
    /// Owner's role at the time of posting
    pub role: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub view_count: i64,
    /// Kind-specific fields (bedrooms, brand, subjects, ...)
    pub attributes: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Every string field a keyword search looks at, paired with its name
    pub fn searchable_text(&self) -> Vec<(&str, String)> {
        let mut fields = vec![("title", self.title.clone())];
        let optional = [
            ("description", &self.description),
            ("category", &self.category),
            ("city", &self.city),
            ("area", &self.area),
            ("address", &self.address),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                fields.push((name, value.clone()));
            }
        }
        for value in self.attributes.values() {
            collect_strings(value, &mut |s| fields.push(("attributes", s.to_string())));
        }
        fields
    }
}

fn collect_strings(value: &Value, sink: &mut impl FnMut(&str)) {
    match value {
        Value::String(s) => sink(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, sink)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, sink)),
        _ => {}
    }
}

/// A price as the admin forms send it: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    /// `Ok(None)` for a blank string, `Err` for text that isn't a number
    pub fn parse(&self) -> Result<Option<f64>, String> {
        match self {
            PriceInput::Number(n) if n.is_finite() => Ok(Some(*n)),
            PriceInput::Number(n) => Err(format!("Invalid price: {}", n)),
            PriceInput::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                if cleaned.is_empty() {
                    return Ok(None);
                }
                cleaned
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(Some)
                    .ok_or_else(|| format!("Invalid price: {}", s))
            }
        }
    }
}

/// Input for creating a listing.
///
/// Unknown top-level keys are collected into `extra` and stored as
/// attributes, so a form can post `bedrooms` next to `title`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingInput {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub price: Option<PriceInput>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub location_id: Option<i64>,
    pub user_id: Option<i64>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub attributes: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial update for a listing; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingInput {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub price: Option<Option<PriceInput>>,
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub category: Option<Option<String>>,
    pub country: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub area: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub contact_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub contact_phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub contact_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub location_id: Option<Option<i64>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    /// Merged key by key into the stored attributes; a `null` value removes the key
    pub attributes: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Listing query filters. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilter {
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub user_id: Option<i64>,
    pub role: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Column names a listing input may not smuggle in through `attributes`.
pub const RESERVED_LISTING_FIELDS: &[&str] = &[
    "id",
    "kind",
    "title",
    "description",
    "price",
    "images",
    "category",
    "country",
    "state",
    "city",
    "area",
    "address",
    "contactName",
    "contactPhone",
    "contactEmail",
    "locationId",
    "userId",
    "role",
    "isActive",
    "isFeatured",
    "viewCount",
    "attributes",
    "createdAt",
    "updatedAt",
];

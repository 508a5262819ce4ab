use crate::i18n::Language;
use serde::Serialize;

/// Localized labels for the content sections and admin notifications.
///
/// Entry content is localized per field inside the documents themselves;
/// these are the fixed strings around it.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageStrings {
    // ==================== Projects ====================
    pub projects_title: &'static str,
    pub projects_heading: &'static str,
    pub projects_all: &'static str,
    pub projects_mobile_app: &'static str,
    pub projects_web_development: &'static str,
    pub projects_tools: &'static str,
    pub projects_live_demo: &'static str,
    pub projects_source_code: &'static str,
    pub projects_technologies: &'static str,

    // ==================== Blog ====================
    pub blog_title: &'static str,
    pub blog_heading: &'static str,
    pub blog_description: &'static str,
    /// Shown when the blog collection is empty
    pub blog_empty: &'static str,
    pub blog_read_more: &'static str,
    pub blog_back: &'static str,

    // ==================== Certificates ====================
    pub certificates_title: &'static str,
    pub certificates_heading: &'static str,
    pub certificates_description: &'static str,
    pub certificates_view_credential: &'static str,

    // ==================== Admin ====================
    /// Validation message when the primary-language title is missing
    pub admin_title_required: &'static str,
    pub admin_entry_added: &'static str,
    pub admin_entry_updated: &'static str,
    /// Confirmation prompt shown before a delete
    pub admin_delete_confirm: &'static str,
    pub admin_reorder_failed: &'static str,
    pub admin_login_failed: &'static str,
}

pub const ENGLISH_STRINGS: LanguageStrings = LanguageStrings {
    projects_title: "Portfolio",
    projects_heading: "Selected Works",
    projects_all: "All",
    projects_mobile_app: "Mobile App",
    projects_web_development: "Web Development",
    projects_tools: "Tools",
    projects_live_demo: "Live Demo",
    projects_source_code: "Source Code",
    projects_technologies: "Technologies",

    blog_title: "Blog",
    blog_heading: "Latest Articles",
    blog_description: "Articles about software, technology and my experiences",
    blog_empty: "No blog posts yet. You can add from admin panel.",
    blog_read_more: "Read More",
    blog_back: "Go Back",

    certificates_title: "Certificates",
    certificates_heading: "My Certifications",
    certificates_description: "Professional certifications and achievements",
    certificates_view_credential: "View Credential",

    admin_title_required: "Title (EN) is required",
    admin_entry_added: "Entry added!",
    admin_entry_updated: "Entry updated!",
    admin_delete_confirm: "Are you sure?",
    admin_reorder_failed: "Error reordering item",
    admin_login_failed: "Incorrect credentials",
};

pub const TURKISH_STRINGS: LanguageStrings = LanguageStrings {
    projects_title: "Portföy",
    projects_heading: "Seçili İşler",
    projects_all: "Tümü",
    projects_mobile_app: "Mobil Uygulama",
    projects_web_development: "Web Geliştirme",
    projects_tools: "Araçlar",
    projects_live_demo: "Canlı Demo",
    projects_source_code: "Kaynak Kod",
    projects_technologies: "Teknolojiler",

    blog_title: "Blog",
    blog_heading: "Son Yazılar",
    blog_description: "Yazılım, teknoloji ve deneyimlerim hakkında yazılar",
    blog_empty: "Henüz blog yazısı yok. Admin panelinden ekleyebilirsiniz.",
    blog_read_more: "Devamını Oku",
    blog_back: "Geri Dön",

    certificates_title: "Sertifikalar",
    certificates_heading: "Sertifikalarım",
    certificates_description: "Profesyonel sertifikalar ve başarılar",
    certificates_view_credential: "Sertifikayı Görüntüle",

    admin_title_required: "Başlık (EN) zorunludur",
    admin_entry_added: "Kayıt eklendi!",
    admin_entry_updated: "Kayıt güncellendi!",
    admin_delete_confirm: "Emin misiniz?",
    admin_reorder_failed: "Sıralama değiştirilemedi",
    admin_login_failed: "Hatalı kimlik bilgisi",
};

impl LanguageStrings {
    pub fn for_language(language: Language) -> &'static LanguageStrings {
        match language.code() {
            "tr" => &TURKISH_STRINGS,
            _ => &ENGLISH_STRINGS,
        }
    }
}

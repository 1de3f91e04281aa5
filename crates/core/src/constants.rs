//! Constants used throughout the CMF portal core crate.
//!
//! Storage names, intake endpoint paths, localized user-facing messages and the fixed
//! catalogs offered by the request forms.

/// Default directory for profile and preference storage when none is configured.
pub const DEFAULT_DATA_DIR: &str = "portal_data";

/// Directory name for stored profile documents.
pub const PROFILES_DIR_NAME: &str = "profiles";

/// Filename for a stored profile document.
pub const PROFILE_JSON_FILENAME: &str = "profile.json";

/// Filename for persisted accessibility preferences.
pub const PREFERENCES_JSON_FILENAME: &str = "preferences.json";

/// Seconds a transient form message stays visible.
pub const DEFAULT_NOTICE_SECS: u64 = 4;

/// Seconds a session may go unused before its token stops resolving.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 8 * 60 * 60;

/// Intake endpoint receiving prescription requests.
pub const PRESCRIPTION_ENDPOINT_PATH: &str = "enviar-receta";

/// Intake endpoint receiving appointment requests.
pub const APPOINTMENT_ENDPOINT_PATH: &str = "enviar-turno";

/// Catalog value meaning "not in this list, see the free-text field".
pub const OTHER_SENTINEL: &str = "Otro";

/// Insurance provider value for self-paying patients; no membership number applies.
pub const SELF_PAY_PROVIDER: &str = "Particular";

/// Minimum length accepted when changing the password from the profile page.
pub const MIN_PASSWORD_CHANGE_LEN: usize = 6;

/// Minimum length of a password at registration.
pub const MIN_REGISTRATION_PASSWORD_LEN: usize = 8;

/// Consecutive failed sign-ins before the in-process identity provider throttles an account.
pub const MAX_FAILED_SIGN_INS: u32 = 5;

/// Commercial medication names offered by the prescription form, without the sentinel.
pub const MEDICATION_NAMES: &[&str] = &[
    "Aspirina",
    "Ibuprofeno",
    "Paracetamol",
    "Amoxicilina",
    "Omeprazol",
    "Metformina",
    "Losartan",
    "Atorvastatina",
    "Levotiroxina",
    "Enalapril",
    "Simvastatina",
    "Clonazepam",
    "Sertralina",
    "Ranitidina",
    "Azitromicina",
    "Diclofenac",
    "Prednisona",
    "Salbutamol",
    "Furosemida",
    "Insulina",
];

/// Pharmaceutical forms offered by the prescription form, without the sentinel.
pub const PHARMACEUTICAL_FORMS: &[&str] = &[
    "Comprimido",
    "Tableta",
    "Cápsula",
    "Jarabe",
    "Solución",
    "Suspensión",
    "Crema",
    "Ungüento",
    "Gel",
    "Gotas",
    "Inyectable",
    "Aerosol",
    "Supositorio",
    "Parche",
];

/// Medical specialties offered by the appointment form.
pub const SPECIALTIES: &[&str] = &[
    "Medicina General",
    "Cardiología",
    "Dermatología",
    "Ginecología",
    "Neurología",
    "Oftalmología",
    "Pediatría",
    "Psiquiatría",
    "Traumatología",
    "Urología",
];

/// Preferred time slots offered by the appointment form.
pub const TIME_SLOTS: &[&str] = &[
    "08:00 - 10:00",
    "10:00 - 12:00",
    "14:00 - 16:00",
    "16:00 - 18:00",
    "18:00 - 20:00",
];

/// Insurance providers offered at registration.
pub const INSURANCE_PROVIDERS: &[&str] = &[
    "OSDE",
    "Swiss Medical",
    "SanCor Salud",
    "IOMA",
    "PAMI",
    "Medifé",
    "OSPJN",
    "COMEI",
    "Caja de la Abogacía (PBA)",
    "SADAIC",
    "OPDEA",
    "DASUTeN",
    "Conferencia Episcopal Argentina",
    "Caja Notarial",
    "DASMI",
    "Jerárquicos Salud",
    "OSAPM",
    "Salud para Todos",
    "La Mutual",
    "Techint",
    "APSOT",
    "AMFFA Salud",
    "OSPEBA",
    "OSA (Actores)",
    "OSETYA",
    "MOA",
    "Caja de Seguridad Social",
    SELF_PAY_PROVIDER,
];

/// User-facing messages, es-AR.
pub mod messages {
    pub const PRESCRIPTION_INCOMPLETE: &str =
        "Por favor, completa todos los campos de cada medicamento.";
    pub const PRESCRIPTION_SENT: &str =
        "Solicitud enviada correctamente. Pronto recibirás tu receta por correo.";
    pub const PRESCRIPTION_FAILED: &str = "Error al enviar la solicitud. Intenta nuevamente.";

    pub const APPOINTMENT_INCOMPLETE: &str = "Por favor, completa todos los campos obligatorios";
    pub const APPOINTMENT_SENT: &str =
        "Solicitud de turno enviada exitosamente. Te contactaremos pronto.";
    pub const APPOINTMENT_FAILED: &str = "Error al enviar la solicitud de turno";

    pub const CONNECTION_FAILED: &str = "Error de conexión. Intenta más tarde.";
    pub const REQUEST_IN_FLIGHT: &str = "Ya hay una solicitud en curso.";
    pub const NOT_AUTHENTICATED: &str = "Usuario no autenticado";
    pub const INTERNAL_ERROR: &str = "Ocurrió un error inesperado. Intenta nuevamente.";

    pub const PROFILE_SAVED: &str = "Perfil guardado";
    pub const PASSWORDS_DO_NOT_MATCH: &str = "Las contraseñas no coinciden";
    pub const PASSWORD_CHANGE_TOO_SHORT: &str = "La contraseña debe tener al menos 6 caracteres";
    pub const PASSWORD_UPDATED: &str = "Contraseña actualizada";

    pub const RESET_EMAIL_REQUIRED: &str = "Ingresa tu email para recuperar la contraseña";
    pub const RESET_EMAIL_SENT: &str = "Te enviamos un correo para restablecer tu contraseña";
    pub const ACCOUNT_CREATED: &str =
        "Cuenta creada. Te enviamos un email para verificar tu cuenta.";
}

//! Handle del entorno host que recibe el motor y se pasa a cada efecto.

use chrono::{Local, NaiveDate};

/// Lo único que el core necesita del host: rol actual y fecha de negocio.
pub trait HostContext {
    /// Rol (id subrogado) del actor actual, si hay sesión.
    fn current_role(&self) -> Option<i64>;
    /// Fecha contra la que se evalúan las ventanas de validez.
    fn today(&self) -> NaiveDate;
}

/// Host fijo: rol y fecha explícitos (tests, CLI, jobs batch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticHost {
    pub role: Option<i64>,
    pub today: NaiveDate,
}

impl StaticHost {
    pub fn new(role: Option<i64>, today: NaiveDate) -> Self {
        Self { role, today }
    }
}

impl HostContext for StaticHost {
    fn current_role(&self) -> Option<i64> {
        self.role
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

/// Host con la fecha local del servidor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemHost {
    pub role: Option<i64>,
}

impl HostContext for SystemHost {
    fn current_role(&self) -> Option<i64> {
        self.role
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

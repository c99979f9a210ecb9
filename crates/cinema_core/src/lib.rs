pub mod domain;
pub mod ports;
pub mod text_repair;

pub use domain::{
    AuthSession, DatabaseInfo, Hall, Movie, NewMovie, NewScreening, NewTariff, NewTicket,
    NewUser, ScheduleEntry, ScreeningDetail, Seat, SoldTicket, Tariff, User, ADMIN_ROLE,
};
pub use ports::{DatabaseService, PortError, PortResult};
pub use text_repair::{repair_text, TextRepair};

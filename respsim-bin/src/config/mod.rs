mod scenario;

pub use self::scenario::Scenario;

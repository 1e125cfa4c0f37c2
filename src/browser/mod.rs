pub mod headless;

pub use headless::launch_portal_browser;

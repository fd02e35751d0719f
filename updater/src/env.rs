/// Loads the environment variables from a `.env` file, if it exists.
pub fn load_dotenvy_vars_if_present() {
    dotenvy::dotenv().ok();
}

use rand::Rng;

/// Six-digit one-time registration code.
pub fn generate_otp() -> String {
    let mut rng = rand::rng();
    format!("{:06}", rng.random_range(100000..=999999))
}

use sysinfo::System;

const SAFETY_FACTOR: u64 = 2;

/// Bits per decoded pixel for the formats the optimizer accepts.
pub fn bits_per_pixel(mime_type: &str) -> u64 {
    match mime_type {
        "image/jpeg" => 24,
        _ => 32,
    }
}

/// Rough decode footprint: `width * height * bpp/8 * 2`.
pub fn estimate_decode_bytes(width: u32, height: u32, bits_per_pixel: u64) -> u64 {
    (width as u64)
        .saturating_mul(height as u64)
        .saturating_mul(bits_per_pixel / 8)
        .saturating_mul(SAFETY_FACTOR)
}

/// The configured budget may be raised up to what the system has free.
pub fn fits_in_budget(required: u64, budget: u64, available: u64) -> bool {
    required <= budget.max(available)
}

pub fn available_memory() -> u64 {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.available_memory()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_uses_safety_factor() {
        assert_eq!(estimate_decode_bytes(1000, 1000, 24), 6_000_000);
        assert_eq!(estimate_decode_bytes(1000, 1000, 32), 8_000_000);
    }

    #[test]
    fn estimate_saturates_instead_of_overflowing() {
        assert_eq!(estimate_decode_bytes(u32::MAX, u32::MAX, 32), u64::MAX);
    }

    #[test]
    fn budget_can_be_raised_to_available_memory() {
        assert!(fits_in_budget(100, 200, 0));
        assert!(fits_in_budget(300, 200, 400));
        assert!(!fits_in_budget(500, 200, 400));
    }
}

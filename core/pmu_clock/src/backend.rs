/// The PMU registers written while bringing up the cycle counter.
/// The discriminant is the CP15 `opc2` of the `c9, c12` encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PmuRegister {
    /// PMCR, `c9, c12, 0`.
    Control = 0,
    /// PMCNTENSET, `c9, c12, 1`.
    CountEnableSet = 1,
    /// PMCNTENCLR, `c9, c12, 2`.
    CountEnableClear = 2,
}

impl PmuRegister {
    #[inline]
    pub const fn opc2(self) -> u8 {
        self as u8
    }
}

/// Access to one PMU cycle counter.
///
/// Registers are process-global hardware, hence `&self` everywhere.
pub trait PmuBackend: Send + Sync {
    fn write(&self, register: PmuRegister, value: u32);

    /// Current value of the cycle count register (PMCCNTR).
    fn read_cycle_count(&self) -> u32;

    /// Whether user mode may touch the PMU. Backends that cannot tell say yes.
    fn user_access_enabled(&self) -> bool {
        true
    }
}

impl<B: PmuBackend + ?Sized> PmuBackend for &B {
    fn write(&self, register: PmuRegister, value: u32) {
        (**self).write(register, value)
    }

    fn read_cycle_count(&self) -> u32 {
        (**self).read_cycle_count()
    }

    fn user_access_enabled(&self) -> bool {
        (**self).user_access_enabled()
    }
}

impl<B: PmuBackend + ?Sized> PmuBackend for std::sync::Arc<B> {
    fn write(&self, register: PmuRegister, value: u32) {
        (**self).write(register, value)
    }

    fn read_cycle_count(&self) -> u32 {
        (**self).read_cycle_count()
    }

    fn user_access_enabled(&self) -> bool {
        (**self).user_access_enabled()
    }
}

/// Backend used by [`crate::global`]: CP15 on ARM, a host counter elsewhere.
#[cfg(all(target_arch = "arm", not(target_feature = "mclass")))]
pub type DefaultBackend = crate::armv7a::Cp15;

/// Backend used by [`crate::global`]: CP15 on ARM, a host counter elsewhere.
#[cfg(not(target_arch = "arm"))]
pub type DefaultBackend = crate::fallback::HostCounter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_encoding() {
        assert_eq!(PmuRegister::Control.opc2(), 0);
        assert_eq!(PmuRegister::CountEnableSet.opc2(), 1);
        assert_eq!(PmuRegister::CountEnableClear.opc2(), 2);
    }

    #[cfg(not(target_arch = "arm"))]
    #[test]
    fn test_default_backend_off_arm_is_host_counter() {
        assert_eq!(
            std::any::type_name::<DefaultBackend>(),
            std::any::type_name::<crate::fallback::HostCounter>()
        );
    }

    #[cfg(all(target_arch = "arm", not(target_feature = "mclass")))]
    #[test]
    fn test_default_backend_on_a_profile_is_cp15() {
        assert_eq!(
            std::any::type_name::<DefaultBackend>(),
            std::any::type_name::<crate::armv7a::Cp15>()
        );
    }
}

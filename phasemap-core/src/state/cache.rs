use super::{Derivative, PartialDerivative};
use num_dual::{Dual2_64, Dual3_64, Dual64, HyperDual64};
use std::collections::HashMap;

/// Residual Helmholtz energy and its derivatives (reduced units) that
/// were already evaluated for a state.
#[derive(Clone, Debug)]
pub(crate) struct Cache {
    map: HashMap<PartialDerivative, f64>,
}

impl Cache {
    pub fn with_capacity(components: usize) -> Cache {
        // zeroth, first and second derivatives in T, V and N_i plus the mixed N_i N_j ones
        let capacity = 6 + 3 * components + components * (components + 1) / 2;
        Cache {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Return the cached value of `key` or evaluate the dual number and
    /// store every derivative it carries.
    fn get_or_insert<const N: usize>(
        &mut self,
        key: PartialDerivative,
        evaluate: impl FnOnce() -> [(PartialDerivative, f64); N],
    ) -> f64 {
        if let Some(&value) = self.map.get(&key) {
            return value;
        }
        let mut result = f64::NAN;
        for (k, v) in evaluate() {
            if k == key {
                result = v;
            }
            self.map.insert(k, v);
        }
        result
    }

    pub fn get_or_insert_with_f64<F: FnOnce() -> f64>(&mut self, f: F) -> f64 {
        use PartialDerivative::Zeroth;
        self.get_or_insert(Zeroth, || [(Zeroth, f())])
    }

    pub fn get_or_insert_with_d64<F: FnOnce() -> Dual64>(
        &mut self,
        derivative: Derivative,
        f: F,
    ) -> f64 {
        use PartialDerivative::*;
        self.get_or_insert(First(derivative), || {
            let d = f();
            [(Zeroth, d.re), (First(derivative), d.eps)]
        })
    }

    pub fn get_or_insert_with_d2_64<F: FnOnce() -> Dual2_64>(
        &mut self,
        derivative: Derivative,
        f: F,
    ) -> f64 {
        use PartialDerivative::*;
        self.get_or_insert(Second(derivative), || {
            let d = f();
            [
                (Zeroth, d.re),
                (First(derivative), d.v1),
                (Second(derivative), d.v2),
            ]
        })
    }

    /// Mixed derivatives are stored with their variables in ascending order.
    pub fn get_or_insert_with_hd64<F: FnOnce() -> HyperDual64>(
        &mut self,
        derivative1: Derivative,
        derivative2: Derivative,
        f: F,
    ) -> f64 {
        use PartialDerivative::*;
        let key = SecondMixed(derivative1.min(derivative2), derivative1.max(derivative2));
        self.get_or_insert(key, || {
            let d = f();
            [
                (Zeroth, d.re),
                (First(derivative1), d.eps1),
                (First(derivative2), d.eps2),
                (key, d.eps1eps2),
            ]
        })
    }

    pub fn get_or_insert_with_d3_64<F: FnOnce() -> Dual3_64>(
        &mut self,
        derivative: Derivative,
        f: F,
    ) -> f64 {
        use PartialDerivative::*;
        self.get_or_insert(Third(derivative), || {
            let d = f();
            [
                (Zeroth, d.re),
                (First(derivative), d.v1),
                (Second(derivative), d.v2),
                (Third(derivative), d.v3),
            ]
        })
    }
}

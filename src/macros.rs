/// Implements `Copy`, `Clone`, `Default` and `Debug` for a struct whose fields all share
/// the type parameter, together with an `is_finite` check over all fields.
///
/// ## Example
/// ```ignore
/// impl_standard_traits!(Quaternion, T, w, x, y, z);
/// ```
#[macro_export]
macro_rules! impl_standard_traits {
    ($type_name:ident, $type_param:ident, $first:ident $(, $field:ident)*) => {
        impl<$type_param> Copy for $type_name<$type_param> where $type_param: Copy {}

        impl<$type_param> Clone for $type_name<$type_param>
        where
            $type_param: Clone,
        {
            fn clone(&self) -> Self {
                Self {
                    $first: self.$first.clone(),
                    $($field: self.$field.clone()),*
                }
            }
        }

        impl<$type_param> Default for $type_name<$type_param>
        where
            $type_param: Default,
        {
            #[inline]
            fn default() -> Self {
                Self {
                    $first: Default::default(),
                    $($field: Default::default()),*
                }
            }
        }

        impl<$type_param> core::fmt::Debug for $type_name<$type_param>
        where
            $type_param: core::fmt::Debug,
        {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_tuple(stringify!($type_name))
                    .field(&self.$first)
                    $(.field(&self.$field))*
                    .finish()
            }
        }

        impl<$type_param> $type_name<$type_param> {
            /// Determines whether every component is neither NaN nor infinite.
            #[inline]
            pub fn is_finite(&self) -> bool
            where
                $type_param: ::num_traits::Float,
            {
                self.$first.is_finite() $(&& self.$field.is_finite())*
            }
        }

        #[cfg(test)]
        paste::paste! {
            #[cfg(test)]
            mod [<tests_gen_ $type_name:lower>] {
                use super::*;

                #[test]
                fn test_default_is_finite() {
                    let value = $type_name::<f64>::default();
                    assert!(value.is_finite());
                }

                #[test]
                fn test_nan_is_not_finite() {
                    let mut value = $type_name::<f64>::default();
                    value.$first = f64::NAN;
                    assert!(!value.is_finite());

                    let mut value = $type_name::<f64>::default();
                    value.$first = f64::INFINITY;
                    assert!(!value.is_finite());
                }
            }
        }
    };
}

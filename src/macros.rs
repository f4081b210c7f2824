/// Generates lookup accessors over a `heapless::Vec` of servers keyed by their
/// `element` field: `name(element)`, `name_mut(element)` and `add_name(srv)`.
#[macro_export]
macro_rules! element_table {
    ( $name:ident, $typ:ty ) => {
        paste::paste! {
            #[allow(dead_code)]
            pub fn $name(&self, element: u16) -> Option<&$typ> {
                self.$name.iter().find(|srv| srv.element == element)
            }

            #[allow(dead_code)]
            pub fn [<$name _mut>](&mut self, element: u16) -> Option<&mut $typ> {
                self.$name.iter_mut().find(|srv| srv.element == element)
            }

            #[allow(dead_code)]
            pub fn [<add_ $name>](&mut self, srv: $typ) -> $crate::error::Result<()> {
                if self.$name.iter().any(|other| other.element == srv.element) {
                    return Err($crate::error::ServerError::InvalidConfig(
                        concat!("element already hosts a ", stringify!($name), " server"),
                    ));
                }
                self.$name.push(srv).map_err(|_| {
                    $crate::error::ServerError::InvalidConfig(
                        concat!(stringify!($name), " table is full"),
                    )
                })
            }
        }
    };
}

/// Looks up `$name` on the element of `$model` or bails out with `NoSuchModel`.
#[macro_export]
macro_rules! find_server {
    ( $self:ident, $name:ident, $model:expr ) => {
        paste::paste! {
            $self.[<$name _mut>]($model.element).ok_or($crate::error::ServerError::NoSuchModel {
                model: $model.id,
                element: $model.element,
            })?
        }
    };
}

macro_rules! each_shape {
  ($shape:ident => $expr:expr) => {
    #[cfg(any(coverage, coverage_nightly, miri))]
    {
      $crate::utils::each_shape!(
        @impl $shape => $expr,
        (1, 16), (4, 16), (3, 64),
      );
    }

    #[cfg(not(any(coverage, coverage_nightly, miri)))]
    {
      $crate::utils::each_shape!(
        @impl $shape => $expr,
        (1, 1), (1, 16), (2, 8), (3, 64), (4, 16), (5, 32), (8, 128), (16, 64), (64, 32),
      );
    }
  };
  (@impl $shape:ident => $expr:expr, $(($segments:expr, $capacity:expr)),+ $(,)?) => {
    $(
      $crate::utils::each_shape!(@run $shape => $expr, $segments, $capacity);
    )+
  };
  (@run $shape:ident => $expr:expr, $segments:expr, $capacity:expr) => {{
    let $shape: $crate::params::Shape = $crate::params::Shape::new($segments, $capacity).unwrap();
    $expr
  }};
}

pub(crate) use each_shape;
